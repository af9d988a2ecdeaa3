//! Schema creation and expiry purge.

use std::time::Duration;

use anyhow::{Context, Result};
use tokenkeep::TokenStore;
use tokio::time::MissedTickBehavior;

use crate::cli::PurgeArgs;
use crate::output::print_success;

pub async fn migrate(store: &TokenStore) -> Result<()> {
    store
        .ensure_schema()
        .await
        .with_context(|| format!("failed to create table {}", store.table()))?;
    print_success(&format!("Table {} is ready", store.table()));
    Ok(())
}

pub async fn purge(store: &TokenStore, args: &PurgeArgs) -> Result<()> {
    match args.every {
        Some(every) => {
            purge_every(store, Duration::from_secs(every), async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            })
            .await
        }
        None => purge_once(store, args.now).await,
    }
}

/// Purges on every tick until `shutdown` resolves. The shutdown future is
/// polled for the whole loop, including while a round is running.
async fn purge_every(
    store: &TokenStore,
    every: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    tracing::info!(every_secs = every.as_secs(), "Purging expired token records periodically");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }

        tokio::select! {
            result = purge_once(store, None) => {
                // A failed round is reported and the loop waits for the next tick.
                if let Err(e) = result {
                    tracing::warn!(error = %format!("{e:#}"), "Purge round failed");
                }
            }
            _ = &mut shutdown => break,
        }
    }

    tracing::info!("Interrupted, stopping purge loop");
    Ok(())
}

async fn purge_once(store: &TokenStore, now: Option<i64>) -> Result<()> {
    let purged = match now {
        Some(now) => store.purge_expired(now).await,
        None => store.purge_expired_now().await,
    }
    .context("failed to purge expired token records")?;
    print_success(&format!("Purged {purged} expired record(s)"));
    Ok(())
}

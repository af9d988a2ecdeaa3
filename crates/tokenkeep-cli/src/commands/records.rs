//! Operator commands on individual records and subjects.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tokenkeep::{PresentedToken, RecordKey, TokenClaims, TokenHooks, TokenStore};

use crate::cli::{KeyArgs, RevokeAllArgs};
use crate::output::{print_record, print_success};

pub async fn count(store: &TokenStore) -> Result<()> {
    let count = store.count().await.context("failed to count token records")?;
    println!("{}: {}", store.table().to_string().cyan(), count);
    Ok(())
}

pub async fn show(store: &TokenStore, args: &KeyArgs) -> Result<()> {
    let key = RecordKey::new(&args.jti, &args.aud);
    let record = store
        .find(&key)
        .await
        .with_context(|| format!("failed to look up {key}"))?;

    match record {
        Some(record) => {
            print_record(&record);
            Ok(())
        }
        None => bail!("No record for {key}"),
    }
}

/// Revokes through the hook so operator revocations log like framework ones.
pub async fn revoke(hooks: &TokenHooks, args: &KeyArgs) -> Result<()> {
    let claims = TokenClaims::builder()
        .jti(&args.jti)
        .audience(&args.aud)
        .build();
    let key = claims.key();

    // The raw token is not needed to locate the record.
    hooks
        .on_revoke(PresentedToken::new(claims, String::new()))
        .await
        .with_context(|| format!("failed to revoke {key}"))?;

    print_success(&format!("Revoked {key}"));
    Ok(())
}

pub async fn revoke_all(store: &TokenStore, args: &RevokeAllArgs) -> Result<()> {
    let revoked = store
        .revoke_all(&args.sub)
        .await
        .with_context(|| format!("failed to revoke tokens for subject '{}'", args.sub))?;
    print_success(&format!(
        "Revoked {revoked} token(s) for subject '{}'",
        args.sub
    ));
    Ok(())
}

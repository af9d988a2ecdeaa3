//! Opens the configured backend and assembles the store.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokenkeep::config::BackendSettings;
use tokenkeep::{ConfigError, MemoryBackend, Settings, StoreConfig, TokenBackend};
use tokenkeep_postgres::PostgresBackend;

pub async fn open_backend(settings: &BackendSettings) -> Result<Arc<dyn TokenBackend>> {
    match settings {
        BackendSettings::Memory => {
            tracing::warn!("Using the in-memory backend; records are discarded on exit");
            Ok(Arc::new(MemoryBackend::new()))
        }
        BackendSettings::Postgres(pg) => {
            let backend = PostgresBackend::connect(pg)
                .await
                .context("failed to connect to PostgreSQL")?;
            Ok(Arc::new(backend))
        }
    }
}

pub fn store_config(
    settings: &Settings,
    backend: Arc<dyn TokenBackend>,
) -> Result<StoreConfig, ConfigError> {
    let table = settings.table_ref()?;
    let mut builder = StoreConfig::builder().backend(backend).table(table.name());
    if let Some(schema) = table.schema() {
        builder = builder.prefix(schema);
    }
    builder.build()
}

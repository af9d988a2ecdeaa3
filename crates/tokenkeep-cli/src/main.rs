mod backend;
mod cli;
mod commands;
mod observability;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokenkeep::config::loader::load_settings;
use tokenkeep::{TokenHooks, TokenStore};

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();
    observability::init_tracing_with_level(cli.log_level.as_deref().unwrap_or("info"));

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            print_error(&format!("Configuration error: {e}"));
            std::process::exit(2);
        }
    };

    if cli.log_level.is_none() {
        observability::apply_logging_level(&settings.logging.level);
    }

    let backend_settings = match settings.backend() {
        Ok(b) => b,
        Err(e) => {
            print_error(&format!("Configuration error: {e}"));
            std::process::exit(2);
        }
    };
    tracing::debug!(backend = backend_settings.kind(), "Configuration loaded");

    let backend = match backend::open_backend(backend_settings).await {
        Ok(b) => b,
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    };

    let store = match backend::store_config(&settings, backend) {
        Ok(config) => Arc::new(TokenStore::new(config)),
        Err(e) => {
            print_error(&format!("Configuration error: {e}"));
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli.command, store).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(command: Commands, store: Arc<TokenStore>) -> Result<()> {
    match &command {
        Commands::Migrate => commands::maintenance::migrate(&store).await?,
        Commands::Purge(args) => commands::maintenance::purge(&store, args).await?,
        Commands::Count => commands::records::count(&store).await?,
        Commands::Show(args) => commands::records::show(&store, args).await?,
        Commands::Revoke(args) => {
            let hooks = TokenHooks::new(Arc::clone(&store));
            commands::records::revoke(&hooks, args).await?;
        }
        Commands::RevokeAll(args) => commands::records::revoke_all(&store, args).await?,
    }

    Ok(())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tokenkeep")]
#[command(about = "tokenkeep: manage the token record store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file [default: tokenkeep.toml, if present]
    #[arg(short, long, global = true, env = "TOKENKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level filter (overrides logging.level; RUST_LOG wins over both)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the schema, table and indexes if missing
    Migrate,
    /// Delete records whose tokens have expired
    Purge(PurgeArgs),
    /// Print the number of stored records
    Count,
    /// Show a stored record (raw token elided)
    Show(KeyArgs),
    /// Revoke a token by its jti and audience
    Revoke(KeyArgs),
    /// Revoke every token issued to a subject
    RevokeAll(RevokeAllArgs),
}

#[derive(clap::Args)]
pub struct PurgeArgs {
    /// Purge as of this Unix timestamp instead of the current time
    #[arg(long, conflicts_with = "every")]
    pub now: Option<i64>,
    /// Keep purging every N seconds until interrupted
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub every: Option<u64>,
}

#[derive(clap::Args)]
pub struct KeyArgs {
    /// Token identifier (jti claim)
    #[arg(long)]
    pub jti: String,
    /// Token audience (aud claim)
    #[arg(long, default_value = "")]
    pub aud: String,
}

#[derive(clap::Args)]
pub struct RevokeAllArgs {
    /// Subject (sub claim)
    #[arg(long)]
    pub sub: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_purge_once() {
        let cli = Cli::try_parse_from(["tokenkeep", "purge", "--now", "1700000000"]).unwrap();
        match cli.command {
            Commands::Purge(args) => {
                assert_eq!(args.now, Some(1_700_000_000));
                assert_eq!(args.every, None);
            }
            _ => panic!("expected purge"),
        }
    }

    #[test]
    fn test_purge_now_conflicts_with_every() {
        let result = Cli::try_parse_from(["tokenkeep", "purge", "--now", "1", "--every", "60"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_purge_every_must_be_positive() {
        assert!(Cli::try_parse_from(["tokenkeep", "purge", "--every", "0"]).is_err());
    }

    #[test]
    fn test_parse_revoke_with_default_audience() {
        let cli = Cli::try_parse_from(["tokenkeep", "revoke", "--jti", "abc123"]).unwrap();
        match cli.command {
            Commands::Revoke(args) => {
                assert_eq!(args.jti, "abc123");
                assert_eq!(args.aud, "");
            }
            _ => panic!("expected revoke"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tokenkeep",
            "revoke-all",
            "--sub",
            "user:1",
            "--config",
            "/etc/tokenkeep.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/tokenkeep.toml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::RevokeAll(ref a) if a.sub == "user:1"));
    }
}

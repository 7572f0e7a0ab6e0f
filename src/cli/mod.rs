//! Command-line interface.
//!
//! `key` and `config` work offline. `stats`, `metrics`, `report` and `clear`
//! talk to the monitor endpoint of a process that embeds the cache.

mod config;
mod key;
mod remote;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rescache")]
#[command(version, about = "Inspect and administer resource instance caches")]
pub(crate) struct Cli {
    /// Emit logs as JSON lines (also RESCACHE_LOG_JSON=1)
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Derive the cache key for an ordered attribute tuple
    Key {
        /// Attributes in key order, e.g. tenant provider model
        #[arg(required = true)]
        attributes: Vec<String>,
    },
    /// Show the effective configuration
    Config {
        /// Only print the config file path
        #[arg(long)]
        path: bool,
        /// Read this file instead of ~/.rescache/config.json
        #[arg(long, value_name = "FILE")]
        file: Option<std::path::PathBuf>,
    },
    /// Show per-cache statistics from a running monitor
    Stats {
        #[command(flatten)]
        target: RemoteArgs,
        /// Print the raw JSON body
        #[arg(long)]
        json: bool,
    },
    /// Print Prometheus metrics from a running monitor
    Metrics {
        #[command(flatten)]
        target: RemoteArgs,
    },
    /// Show the estimated time saved by caching
    Report {
        #[command(flatten)]
        target: RemoteArgs,
        /// Print the raw JSON body
        #[arg(long)]
        json: bool,
    },
    /// Clear cached entries (or only statistics) on a running monitor
    Clear {
        #[command(flatten)]
        target: RemoteArgs,
        /// Reset statistics instead of dropping entries
        #[arg(long)]
        stats: bool,
        /// Only this cache (e.g. embedding, rerank_model)
        #[arg(long)]
        cache: Option<String>,
        /// Admin bearer token (defaults to the configured admin token)
        #[arg(long)]
        token: Option<String>,
    },
}

/// Where to find the monitor endpoint.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct RemoteArgs {
    /// Monitor address as host:port (defaults to the configured monitor)
    #[arg(long)]
    addr: Option<String>,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "rescache=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

pub(crate) async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs || env_flag("RESCACHE_LOG_JSON"));

    match cli.command {
        Commands::Key { attributes } => key::cmd_key(&attributes),
        Commands::Config { path, file } => config::cmd_config(path, file.as_deref()),
        Commands::Stats { target, json } => remote::cmd_stats(&target, json).await,
        Commands::Metrics { target } => remote::cmd_metrics(&target).await,
        Commands::Report { target, json } => remote::cmd_report(&target, json).await,
        Commands::Clear {
            target,
            stats,
            cache,
            token,
        } => remote::cmd_clear(&target, stats, cache.as_deref(), token).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_clear_flags() {
        let cli = Cli::try_parse_from([
            "rescache",
            "clear",
            "--stats",
            "--cache",
            "embedding",
            "--addr",
            "127.0.0.1:9999",
        ])
        .unwrap();
        match cli.command {
            Commands::Clear {
                target,
                stats,
                cache,
                ..
            } => {
                assert!(stats);
                assert_eq!(cache.as_deref(), Some("embedding"));
                assert_eq!(target.addr.as_deref(), Some("127.0.0.1:9999"));
            }
            _ => panic!("expected clear"),
        }
    }

    #[test]
    fn test_key_requires_attributes() {
        assert!(Cli::try_parse_from(["rescache", "key"]).is_err());
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "livemetrics",
    version,
    about = "Keep live model metric cards up to date from a performance endpoint"
)]
pub struct Args {
    /// Configuration file (defaults to <config dir>/livemetrics/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the dashboard backend
    #[arg(long, env = "LIVEMETRICS_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Path of the performance endpoint
    #[arg(long, global = true)]
    pub endpoint_path: Option<String>,

    /// Refresh interval in milliseconds
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,

    /// Request timeout in seconds
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,

    /// Hide a metric card by its identifier (repeatable)
    #[arg(long = "hide", value_name = "ID", global = true)]
    pub hidden: Vec<String>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll continuously and print the cards after every update
    Watch {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,
    },

    /// Refresh once and print the cards
    Once {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,
    },

    /// Show the effective configuration
    Config {
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_with_overrides() {
        let args = Args::try_parse_from([
            "livemetrics",
            "watch",
            "--base-url",
            "http://localhost:5000",
            "--interval-ms",
            "2000",
            "--hide",
            "trainingSamples",
            "-o",
            "json",
        ])
        .unwrap();

        assert_eq!(args.base_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(args.interval_ms, Some(2000));
        assert_eq!(args.hidden, vec!["trainingSamples".to_string()]);
        assert!(matches!(
            args.command,
            Commands::Watch {
                output: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["livemetrics", "-v", "-q", "once"]).is_err());
    }
}

//! qtfm - command-line access to QingTing FM stream signing and the station directory
//!
//! - `qtfm sign [STATION_ID]` prints one signed stream URL
//! - `qtfm dump [--output FILE]` writes every region and its stations to JSON
//!
//! Logs go to stderr so stdout carries only the result.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qtfm_common::config::TomlConfig;
use qtfm_common::{Clock, DirectoryClient, FixedClock, StreamSigner, SystemClock};
use tracing::{debug, info};

mod dump;

/// Command-line arguments for qtfm
#[derive(Parser, Debug)]
#[command(name = "qtfm")]
#[command(about = "QingTing FM stream URL signer and directory dump")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "QTFM_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Print a signed stream URL for one station
    Sign {
        /// Station id
        #[arg(default_value = "273")]
        station_id: String,

        /// Sign as if the current time were this Unix timestamp (seconds)
        #[arg(long)]
        timestamp: Option<i64>,
    },

    /// Fetch every region and its stations into a JSON file
    Dump {
        /// Output file
        #[arg(short, long, default_value = "data.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TomlConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "qtfm={level},qtfm_common={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .init();

    match &config.source {
        Some(path) => debug!("Configuration loaded from {}", path.display()),
        None => debug!("No configuration file found, using built-in defaults"),
    }

    match cli.command {
        Command::Sign {
            station_id,
            timestamp,
        } => {
            let clock: Arc<dyn Clock> = match timestamp {
                Some(secs) => Arc::new(
                    FixedClock::at_unix(secs)
                        .with_context(|| format!("Timestamp out of range: {}", secs))?,
                ),
                None => Arc::new(SystemClock),
            };
            let signer = StreamSigner::new(&config.signing).context("Failed to create signer")?;
            println!("{}", signer.sign(&station_id, clock.now()));
        }
        Command::Dump { output } => {
            let client =
                DirectoryClient::new(&config.upstream).context("Failed to create HTTP client")?;
            let directory = dump::fetch_directory(&client)
                .await
                .context("Failed to fetch station directory")?;
            dump::write_dump(&output, &directory)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                regions = directory.regions.len(),
                stations = directory.station_count(),
                "Data successfully saved to {}",
                output.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_defaults_to_station_273() {
        let cli = Cli::try_parse_from(["qtfm", "sign"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Sign {
                station_id: "273".to_string(),
                timestamp: None,
            }
        );
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_sign_with_timestamp() {
        let cli =
            Cli::try_parse_from(["qtfm", "sign", "20003", "--timestamp", "1669039359"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Sign {
                station_id: "20003".to_string(),
                timestamp: Some(1_669_039_359),
            }
        );
    }

    #[test]
    fn test_dump_default_output() {
        let cli = Cli::try_parse_from(["qtfm", "dump"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Dump {
                output: PathBuf::from("data.json"),
            }
        );
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["qtfm", "dump", "-o", "out.json", "--config", "q.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("q.toml")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["qtfm"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

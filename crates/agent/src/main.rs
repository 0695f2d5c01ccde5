//! # Mintsale CLI
//!
//! Operator tool for the NFT sale.
//!
//! ## Commands
//!
//! - `phase`: current phase and the OG / FCFS / PUBLIC board
//!   - `--watch`: redraw every second until Ctrl-C
//!   - `--at`: evaluate at an RFC 3339 instant instead of now
//! - `zone`: fetch zone data once and show per-zone eligibility
//!   - `--address`: address to evaluate (default: configured wallet)
//! - `watch`: run the phase clock and zone poller, log state until Ctrl-C
//! - `mint`: run a purchase batch
//!   - `--quantity N`, `--lucky`
//! - `whitelist format <csv> <out>`: CSV first column to whitelist table entries
//! - `whitelist fetch`: collect sender addresses from the gateway GraphQL index
//!
//! ## Global flags
//!
//! - `--config`: TOML config file (env `MINTSALE_CONFIG`)
//! - `--mock`: use the in-memory sale instead of the gateway
//! - `-v`: debug logging; `RUST_LOG` overrides
//!
//! `MINTSALE_*` variables are applied on top of the config file; see
//! `mintsale_core::config`.

mod cmd_mint;
mod cmd_phase;
mod cmd_watch;
mod cmd_whitelist;
mod cmd_zone;
mod context;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::context::AppContext;

#[derive(Parser)]
#[command(version, about = "Mintsale operator CLI")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "MINTSALE_CONFIG")]
    config: Option<PathBuf>,

    /// Use the in-memory sale instead of the gateway
    #[arg(long, global = true)]
    mock: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current phase and the phase board
    Phase {
        /// Redraw every second until Ctrl-C
        #[arg(long)]
        watch: bool,
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long, value_parser = parse_instant, conflicts_with = "watch")]
        at: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },

    /// Fetch zone data once and show eligibility per zone
    Zone {
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Run the phase clock and zone poller until Ctrl-C
    Watch,

    /// Run a purchase batch
    Mint {
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Use the lucky-draw path
        #[arg(long)]
        lucky: bool,
        /// Buyer address (default: configured wallet)
        #[arg(long)]
        address: Option<String>,
    },

    /// Whitelist preparation tools
    Whitelist {
        #[command(subcommand)]
        whitelist_cmd: WhitelistCommands,
    },
}

#[derive(Subcommand)]
enum WhitelistCommands {
    /// Convert the first CSV column into `["addr"] = true,` lines
    Format {
        csv: PathBuf,
        out: PathBuf,
    },

    /// Collect owner addresses of messages sent to a process
    Fetch {
        /// Recipient process id
        #[arg(long)]
        recipient: String,
        /// `Action` tag value to match
        #[arg(long)]
        action: String,
        #[arg(long, default_value = cmd_whitelist::DEFAULT_GRAPHQL_URL)]
        graphql_url: String,
        /// Write addresses here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 instant '{}': {}", s, e))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let load = || {
        AppContext::load(cli.config.as_deref(), cli.mock).context("failed to load configuration")
    };

    match cli.cmd {
        Commands::Phase { watch, at, json } => cmd_phase::run(&load()?, at, watch, json).await?,
        Commands::Zone { address, json } => cmd_zone::run(&load()?, address, json).await?,
        Commands::Watch => cmd_watch::run(&load()?).await?,
        Commands::Mint { quantity, lucky, address } => {
            cmd_mint::run(&load()?, quantity, lucky, address).await?
        }
        Commands::Whitelist { whitelist_cmd } => match whitelist_cmd {
            WhitelistCommands::Format { csv, out } => {
                let count = cmd_whitelist::format_file(&csv, &out)?;
                println!("Processing complete. {} entries written to '{}'.", count, out.display());
            }
            WhitelistCommands::Fetch { recipient, action, graphql_url, out } => {
                cmd_whitelist::fetch(&graphql_url, &recipient, &action, out.as_deref()).await?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_mint_flags() {
        let cli = Cli::try_parse_from(["mintsale", "--mock", "mint", "-q", "3", "--lucky"]).unwrap();
        assert!(cli.mock);
        match cli.cmd {
            Commands::Mint { quantity, lucky, address } => {
                assert_eq!(quantity, 3);
                assert!(lucky);
                assert_eq!(address, None);
            }
            _ => panic!("expected mint"),
        }
    }

    #[test]
    fn phase_at_must_be_rfc3339() {
        assert!(Cli::try_parse_from(["mintsale", "phase", "--at", "2025-02-09T01:00:00Z"]).is_ok());
        assert!(Cli::try_parse_from(["mintsale", "phase", "--at", "tomorrow"]).is_err());
        assert!(Cli::try_parse_from(["mintsale", "phase", "--watch", "--at", "2025-02-09T01:00:00Z"]).is_err());
    }
}

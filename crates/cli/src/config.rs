//! Command-line configuration.
//!
//! The ring order comes from `--order`, else from the `order` field of the
//! JSON file given with `--config`, else the library default.

use std::path::PathBuf;

use anyhow::Context;
use chord_core::RingConfig;
use clap::Parser;

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(
    name = "chord",
    version,
    about = "Simulate and inspect an in-process Chord ring"
)]
pub struct CliConfig {
    /// Ring order m; identifiers live in [0, 2^m).
    #[arg(short, long, global = true)]
    pub order: Option<u32>,

    /// Path to a JSON ring configuration, e.g. `{ "order": 5 }`.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Resolves the ring configuration from the file and flags.
    pub fn ring_config(&self) -> anyhow::Result<RingConfig> {
        let mut config = match &self.config {
            Some(path) => RingConfig::from_json_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => RingConfig::default(),
        };
        if let Some(order) = self.order {
            config.order = order;
        }
        config.validate().context("invalid ring configuration")?;
        Ok(config)
    }

    pub fn run(self) -> anyhow::Result<()> {
        setup_tracing(&self.log_level);
        let ring_config = self.ring_config()?;
        let result = self.command.execute(&ring_config)?;
        print!("{}", result);
        Ok(())
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the given level.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_flag_overrides_default() {
        let cli = CliConfig::try_parse_from(["chord", "--order", "7", "show"]).unwrap();
        assert_eq!(cli.ring_config().unwrap().order, 7);

        let cli = CliConfig::try_parse_from(["chord", "show"]).unwrap();
        assert_eq!(cli.ring_config().unwrap(), RingConfig::default());
    }

    #[test]
    fn test_invalid_order_rejected() {
        let cli = CliConfig::try_parse_from(["chord", "show", "--order", "64"]).unwrap();
        assert!(cli.ring_config().is_err());
    }

    #[test]
    fn test_config_file() {
        let path = std::env::temp_dir().join(format!("chord-cli-test-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "order": 9 }"#).unwrap();
        let cli = CliConfig::try_parse_from([
            "chord",
            "--config",
            path.to_str().unwrap(),
            "show",
        ])
        .unwrap();
        assert_eq!(cli.ring_config().unwrap().order, 9);
        std::fs::remove_file(&path).unwrap();
    }
}

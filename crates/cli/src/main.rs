//! CLI entry point for chord-ring-rs.

use chord_cli::CliConfig;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    config.run()
}

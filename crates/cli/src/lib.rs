//! CLI tool for driving an in-process Chord ring.
//!
//! Provides commands for:
//! - Simulating random joins, lookups and a departure
//! - Resolving keys against an explicit set of nodes
//! - Inspecting predecessors, successors, fingers and owned arcs

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;

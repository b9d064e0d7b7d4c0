//! CLI subcommands.
//!
//! Every command builds its ring through the public `chord_core` API and
//! collects its report in a [`CommandResult`]; printing is left to the caller.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use anyhow::{bail, Context};
use chord_core::{ChordRing, Node, NodeId, RingBuilder, RingConfig};
use clap::Subcommand;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Join random peers, resolve random keys, then remove one peer.
    Simulate {
        /// Number of peers to join (besides the founding node 0).
        #[arg(short = 'n', long, default_value_t = 10)]
        peers: usize,

        /// Number of random keys to resolve.
        #[arg(short, long, default_value_t = 5)]
        lookups: usize,

        /// RNG seed for a reproducible run.
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Resolve keys against a ring made of the given node ids.
    Lookup {
        /// Comma-separated node identifiers, e.g. `2,9,20`.
        #[arg(long, value_delimiter = ',')]
        nodes: Vec<u64>,

        /// Keys to resolve.
        #[arg(required = true)]
        keys: Vec<u64>,
    },

    /// Print predecessor, successor, fingers and owned arc of every node.
    Show {
        /// Comma-separated node identifiers; node 0 is dropped unless listed.
        #[arg(long, value_delimiter = ',')]
        nodes: Vec<u64>,
    },
}

/// Lines produced by a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub lines: Vec<String>,
}

impl CommandResult {
    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl Command {
    pub fn execute(&self, config: &RingConfig) -> anyhow::Result<CommandResult> {
        match self {
            Command::Simulate {
                peers,
                lookups,
                seed,
            } => simulate(config, *peers, *lookups, *seed),
            Command::Lookup { nodes, keys } => lookup(config, nodes, keys),
            Command::Show { nodes } => show(config, nodes),
        }
    }
}

/// Ring holding exactly `nodes`; the founding node is dropped unless listed.
fn explicit_ring(config: &RingConfig, nodes: &[u64]) -> anyhow::Result<ChordRing<String>> {
    let mut builder = RingBuilder::with_config(config.clone()).add_nodes(nodes.iter().copied());
    if !nodes.is_empty() {
        builder = builder.without_founder();
    }
    builder.build().context("failed to build ring")
}

fn simulate(
    config: &RingConfig,
    peers: usize,
    lookups: usize,
    seed: Option<u64>,
) -> anyhow::Result<CommandResult> {
    let mut ring: ChordRing<String> = ChordRing::from_config(config)?;
    let size = ring.size();
    if peers as u64 >= size {
        bail!(
            "cannot place {} peers besides node 0 in a ring of {} identifiers",
            peers,
            size
        );
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut out = CommandResult::default();
    // the founding node is a bootstrap member; report peers without it
    out.push(format!(
        "Initial number of peers: {}",
        ring.node_count().saturating_sub(1)
    ));

    let mut taken = BTreeSet::from([0u64]);
    for _ in 0..peers {
        let mut id = rng.gen_range(0..size);
        while !taken.insert(id) {
            id = rng.gen_range(0..size);
        }
        ring.join(Node::new(id))?;
        out.push(format!("Node {} joined the ring.", id));
        out.push(format!(
            "Number of peers in the ring: {}",
            ring.node_count().saturating_sub(1)
        ));
    }
    ring.stabilize()?;

    for _ in 0..lookups {
        let key = rng.gen_range(0..size);
        let route = ring.route(ring.entry().context("ring is empty")?, key)?;
        ring.insert(key, format!("key-{}", key))?;
        out.push(format!(
            "Key {} belongs to node {} ({} hops)",
            key,
            route.owner.0,
            route.hops()
        ));
    }

    let entry = ring.entry().context("ring is empty")?;
    let leaving = ring.successor(entry)?;
    if leaving == entry {
        // only the founding node is left
        out.push("No peer left the ring.");
    } else {
        let departed = ring.leave(leaving)?;
        info!(node = %departed.id(), "simulated departure");
        out.push(format!("Node {} left the ring.", leaving.0));
    }
    out.push(format!(
        "Number of peers in the ring: {}",
        ring.node_count().saturating_sub(1)
    ));
    ring.validate()?;
    Ok(out)
}

fn lookup(config: &RingConfig, nodes: &[u64], keys: &[u64]) -> anyhow::Result<CommandResult> {
    let ring = explicit_ring(config, nodes)?;
    let entry = ring.entry().context("ring is empty")?;
    let mut out = CommandResult::default();
    for key in keys {
        let route = ring.route(entry, *key)?;
        let path: Vec<String> = route.path.iter().map(NodeId::to_string).collect();
        out.push(format!(
            "key {} (id {}) -> {} via {}",
            key,
            route.target,
            route.owner,
            path.join(" -> ")
        ));
    }
    Ok(out)
}

fn show(config: &RingConfig, nodes: &[u64]) -> anyhow::Result<CommandResult> {
    let ring = explicit_ring(config, nodes)?;
    let ranges: HashMap<NodeId, String> = ring
        .topology()
        .ranges()
        .into_iter()
        .map(|range| (range.owner, format!("({}, {}]", range.start, range.end)))
        .collect();

    let mut out = CommandResult::default();
    out.push(format!(
        "ring of order {} ({} identifiers), {} nodes",
        ring.order(),
        ring.size(),
        ring.node_count()
    ));
    for node in ring.iter() {
        let fingers: Vec<String> = node
            .fingers()
            .list()
            .iter()
            .copied()
            .map(|f| f.map_or_else(|| "-".to_string(), |id| id.0.to_string()))
            .collect();
        out.push(format!(
            "{}: pred={} succ={} arc={} fingers=[{}]",
            node.id(),
            node.predecessor().map_or_else(|| "-".to_string(), |id| id.to_string()),
            node.successor().map_or_else(|| "-".to_string(), |id| id.to_string()),
            ranges.get(&node.id()).map(String::as_str).unwrap_or("-"),
            fingers.join(", ")
        ));
    }
    Ok(out)
}

//! critbit - build a crit-bit tree from the command line and print it as a
//! Graphviz dot graph.
//!
//! Usage:
//!   critbit --add foo --add foo/bar --add zipzap --del foo
//!   critbit --random 20 --seed 7 | dot -Tsvg > tree.svg

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use critbit::CritBitTree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn, Level};

const RANDOM_KEY_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Random keys are 0 to `RANDOM_KEY_MAX_LEN - 1` characters long.
const RANDOM_KEY_MAX_LEN: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "critbit")]
#[command(about = "Build a crit-bit tree and print it as a Graphviz dot graph", long_about = None)]
#[command(version)]
struct Cli {
    /// Add KEY to the tree; can be given multiple times
    #[arg(long = "add", value_name = "KEY")]
    adds: Vec<String>,

    /// Delete KEY from the tree after all adds; can be given multiple times
    #[arg(long = "del", value_name = "KEY")]
    dels: Vec<String>,

    /// Insert this many randomly chosen keys after adds and deletes
    #[arg(long, value_name = "TIMES", default_value_t = 0)]
    random: usize,

    /// Seed for --random (OS entropy when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the graph to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the graph can be piped.
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .init();

    let tree = build_tree(&cli);
    debug!(entries = tree.len(), "tree built");

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut w = BufWriter::new(file);
            tree.write_dot(&mut w)
                .and_then(|()| w.flush())
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let mut w = io::stdout().lock();
            tree.write_dot(&mut w)
                .context("failed to write dot graph to stdout")?;
        }
    }

    Ok(())
}

fn build_tree(cli: &Cli) -> CritBitTree<()> {
    let mut tree = CritBitTree::new();
    for key in &cli.adds {
        debug!(key = %key, "add");
        tree.insert(key.as_bytes(), ());
    }
    for key in &cli.dels {
        if tree.remove(key.as_bytes()).is_none() {
            warn!(key = %key, "del: key not in tree");
        }
    }

    if cli.random > 0 {
        let mut rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        for key in random_keys(&mut rng, cli.random) {
            info!("add {key:?}");
            tree.insert(key.as_bytes(), ());
        }
    }
    tree
}

fn random_keys(rng: &mut impl Rng, n: usize) -> Vec<String> {
    (0..n)
        .map(|_| {
            let len = rng.gen_range(0..RANDOM_KEY_MAX_LEN);
            (0..len)
                .map(|_| char::from(RANDOM_KEY_CHARS[rng.gen_range(0..RANDOM_KEY_CHARS.len())]))
                .collect()
        })
        .collect()
}

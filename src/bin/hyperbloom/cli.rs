use clap::{Args, Parser, Subcommand};
use hyperbloom::StorageKind;
use std::path::PathBuf;

/// Build, query and merge persisted Bloom filters
#[derive(Parser, Debug)]
#[command(name = "hyperbloom", version, about = "HyperBloom CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a filter, insert keys and save it
    Build {
        /// Output file
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        geometry: Geometry,
        /// File with one key per line ("-" for stdin)
        #[arg(long)]
        keys: Option<PathBuf>,
        /// Literal key, repeatable
        #[arg(long)]
        key: Vec<String>,
    },
    /// Test keys against a saved filter
    Query {
        #[arg(long)]
        filter: PathBuf,
        /// File with one key per line ("-" for stdin)
        #[arg(long)]
        keys: Option<PathBuf>,
        /// Literal key, repeatable
        #[arg(long)]
        key: Vec<String>,
        /// Print one JSON object per key
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// OR-merge saved filters into the first one
    Merge {
        /// Filter to merge into (rewritten in place)
        #[arg(long)]
        into: PathBuf,
        /// Filters to merge from, all with the same geometry
        #[arg(long, required = true)]
        from: Vec<PathBuf>,
    },
    /// Describe a saved filter
    Info {
        #[arg(long)]
        filter: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Filter geometry, given directly or read from JSON.
#[derive(Args, Debug)]
pub struct Geometry {
    /// JSON file holding a FilterConfig; other geometry flags are ignored
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Number of positions (power of two, at least 64)
    #[arg(long)]
    pub size: Option<usize>,
    /// Number of hash functions
    #[arg(long)]
    pub num_hashes: Option<usize>,
    /// Use striped locking with this many shards
    #[arg(long)]
    pub shards: Option<usize>,
    /// Storage encoding: packed | bytes
    #[arg(long, default_value_t = StorageKind::PackedBits)]
    pub storage: StorageKind,
}

//! CLI argument definitions
//!
//! s3walk is a single-purpose tool, so the arguments are flat: a starting
//! path plus tuning and output flags. Unset tuning flags fall back to the
//! config file, then to built-in defaults.

use clap::Parser;

/// s3walk - Concurrent S3 namespace enumerator
///
/// Lists every object under an s3://bucket/prefix path by expanding the
/// prefix tree breadth-first with a pool of concurrent workers.
#[derive(Parser, Debug)]
#[command(name = "s3walk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Fully qualified starting path (s3://bucket[/prefix])
    pub path: String,

    /// Number of concurrent listing workers
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Levels of hierarchical expansion before switching to flat listing
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Emit each object as one JSON line instead of a human-readable row
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(long)]
    pub debug: bool,
}

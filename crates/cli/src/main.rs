//! s3walk - Concurrent S3 namespace enumerator
//!
//! Lists every object under an s3://bucket/prefix path by expanding the
//! prefix tree breadth-first with a bounded pool of concurrent workers.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod exit_code;
mod output;
mod walk;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; --debug raises the default level when it is unset.
    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let exit_code = walk::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}

//! nodegroup CLI - extract node selections into subprograms.
//!
//! Usage:
//!   nodegroup networks <tree>                  # Networks and their kinds
//!   nodegroup check <tree> --select A,B        # Validate a selection
//!   nodegroup extract <tree> -s A,B -o out     # Extract into a subprogram
//!   nodegroup subprograms <tree>               # Registered subprograms
//!
//! Logging goes to stderr; set RUST_LOG to change the level.

use clap::Parser;
use nodegroup::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

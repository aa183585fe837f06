// Campaign scorer - main.rs
// Loads configuration and the model artifact, then dispatches the CLI command

use campaign_scorer::cli::{run, Cli};
use clap::Parser;
use std::process::exit;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ {e:#}");
        exit(1);
    }
}

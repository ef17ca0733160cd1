//! Binary crate for the `talkweather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive prompts
//! - The query loop that ties weather, speech and reports together

use clap::Parser;

mod cli;
mod console;
mod session;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}

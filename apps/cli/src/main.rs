//! kbscrape CLI: turns a knowledge-base site into one Markdown corpus.
//!
//! Reads the site's sitemap, fetches every selected article and writes the
//! cleaned Markdown documents to a file or stdout.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

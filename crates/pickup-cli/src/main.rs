//! pypickup - a filtered local mirror of a Python simple index

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use pickup_cli::cmd;
use pickup_cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging: RUST_LOG wins, --verbose raises the default to debug
    let default_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::ERROR
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let index_path = cli.index_path.as_path();

    match cli.command {
        Commands::Add { packages, sync } => cmd::add::add(index_path, &packages, &sync).await,
        Commands::Update { packages, sync } => {
            cmd::update::update(index_path, &packages, &sync).await
        }
        Commands::Remove { packages } => cmd::remove::remove(index_path, &packages).await,
        Commands::List { package } => cmd::list::list(index_path, package.as_deref()).await,
        Commands::Config { show, filters } => {
            cmd::config::config(index_path, filters.as_deref(), show)
        }
        Commands::RebuildIndex { package } => {
            cmd::rebuild_index::rebuild_index(index_path, package.as_deref()).await
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}

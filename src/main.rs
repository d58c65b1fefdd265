use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use gtd_nav::config::NavConfig;
use gtd_nav::headless::{format_tree, run_headless};
use gtd_nav::model::ActionFilter;
use gtd_nav::shell::Shell;
use gtd_nav::tui::runner::run_tui;

#[derive(Parser)]
#[command(name = "gtd-nav", about = "Navigation tree for a GTD outline client.")]
struct Cli {
    /// Config file (defaults to ~/.gtdnav + .gtdnav layering)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay a sample session and print the resulting tree
    #[arg(long)]
    headless: bool,

    /// Populate the model from a background thread on startup
    #[arg(long)]
    seed: bool,

    /// Filter applied after the headless session (all, remaining, completed)
    #[arg(long)]
    filter: Option<ActionFilter>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal; keep the log quiet unless asked.
    let default_level = if cli.headless { "gtd_nav=info" } else { "gtd_nav=warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse()?),
        )
        .init();

    let config = match &cli.config {
        Some(path) => NavConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NavConfig::load(),
    };

    if cli.headless {
        info!("gtd-nav starting headless");
        let nodes = run_headless(&config, cli.filter)?;
        print!("{}", format_tree(&config.navigation.dock, &nodes));
        return Ok(());
    }

    // The current-thread runtime keeps the UI on this thread, which
    // makes it the dispatcher's owner.
    let shell = Shell::start(&config)?;
    run_tui(shell, &config.tui, cli.seed).await
}

//! Headless mode — replay a scripted session from a producer thread.
//!
//! The calling thread owns the navigation tree and drains the owner loop
//! while the producer publishes, so every tree write crosses threads.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::config::NavConfig;
use crate::model::{ActionFilter, ClientModel, ModelResult, Perspective};
use crate::nav::TreeNode;
use crate::shell::Shell;

/// A small GTD session touching every kind of model change.
pub fn sample_session(model: &ClientModel) -> ModelResult<()> {
    let milk = model.define_project("Buy milk")?;
    let check = model.add_action(milk, "Check the fridge")?;
    model.add_action(milk, "Go to the store")?;
    model.add_action(milk, "Put milk away")?;
    let paper = model.define_project("Write paper")?;

    for subject in ["Call plumber", "Renew passport", "Read RFC 9110"] {
        model.capture_thought(subject)?;
    }
    let outline = model.capture_thought("Outline the introduction")?;
    model.move_thought_to_project(outline, paper)?;

    let stale = model.capture_thought("Old magazine")?;
    model.archive_thought(stale)?;

    model.complete_action(milk, check)?;
    model.set_filter(model.current_filter())?;
    Ok(())
}

/// Run the sample session and return the resulting tree.
pub fn run_headless(
    config: &NavConfig,
    filter: Option<ActionFilter>,
) -> anyhow::Result<Vec<TreeNode>> {
    let shell = Shell::start(config).context("failed to start shell")?;
    shell.model.load().context("initial load failed")?;

    let model = Arc::clone(&shell.model);
    let producer = thread::Builder::new()
        .name("producer".into())
        .spawn(move || -> ModelResult<()> {
            sample_session(&model)?;
            if let Some(filter) = filter {
                model.set_filter(filter)?;
            }
            Ok(())
        })
        .context("failed to spawn producer")?;

    let ran = shell
        .owner
        .run_until(|| producer.is_finished(), Duration::from_millis(5));
    producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?
        .context("sample session failed")?;
    info!(marshaled = ran, "headless session complete");

    Ok(shell.nav.nodes())
}

/// Render nodes the way the CLI prints them.
pub fn format_tree(dock: &str, nodes: &[TreeNode]) -> String {
    let mut out = format!("[{dock}]\n");
    for node in nodes {
        out.push_str("  ");
        out.push_str(&node.label);
        out.push('\n');
    }
    out
}

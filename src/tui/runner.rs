//! TUI runner — main loop that wires everything together.
//!
//! Must run on the thread that created the [`Shell`]: every tick drains
//! the owner loop, which is where cross-thread navigation updates land.
//! Keyboard input is read on a separate thread and forwarded over a
//! tokio channel so a pending read is never dropped by `select!`.

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::TuiConfig;
use crate::headless::sample_session;
use crate::model::ClientModel;
use crate::shell::Shell;

use super::app::TuiApp;
use super::event::TuiMessage;
use super::layout;

/// Forward crossterm key presses until the receiver goes away.
fn spawn_input_reader(tx: mpsc::UnboundedSender<TuiMessage>) -> io::Result<()> {
    thread::Builder::new()
        .name("tui-input".into())
        .spawn(move || {
            while !tx.is_closed() {
                match event::poll(Duration::from_millis(50)) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        warn!("input poll failed: {e}");
                        break;
                    }
                }
                match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if tx.send(TuiMessage::Input(key)).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("input read failed: {e}");
                        break;
                    }
                }
            }
        })
        .map(|_| ())
}

/// Replay the sample session from a background thread.
pub fn spawn_seed(model: Arc<ClientModel>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name("seed".into()).spawn(move || {
        match sample_session(&model) {
            Ok(()) => info!("seed session finished"),
            Err(e) => warn!("seed session failed: {e}"),
        }
    })
}

/// Run the TUI main loop. Blocks until quit.
pub async fn run_tui(shell: Shell, config: &TuiConfig, seed: bool) -> anyhow::Result<()> {
    let mut app = TuiApp::new(
        &shell.bus,
        shell.model.clone(),
        shell.nav.clone(),
        config.activity_capacity,
    )?;
    shell.model.load()?;

    if seed {
        spawn_seed(shell.model.clone())?;
    }

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let (tx, mut input_rx) = mpsc::unbounded_channel();
    let result: anyhow::Result<()> = match spawn_input_reader(tx) {
        Ok(()) => {
            let mut tick_interval = interval(Duration::from_millis(config.tick_ms.max(1)));
            let mut render_interval = interval(Duration::from_millis(config.render_ms.max(1)));
            loop {
                tokio::select! {
                    _ = tick_interval.tick() => {
                        if shell.owner.pump() > 0 {
                            app.update(TuiMessage::Tick);
                        }
                    }
                    _ = render_interval.tick() => {
                        if let Err(e) = terminal.draw(|f| layout::draw(f, &mut app)) {
                            break Err(e.into());
                        }
                    }
                    Some(msg) = input_rx.recv() => {
                        app.update(msg);
                    }
                }

                if app.should_quit {
                    break Ok(());
                }
            }
        }
        Err(e) => Err(e.into()),
    };

    // Restore terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;

    #[test]
    fn seed_thread_marshals_through_owner_loop() {
        let shell = Shell::start(&NavConfig::default()).unwrap();
        shell.model.load().unwrap();

        let handle = spawn_seed(shell.model.clone()).unwrap();
        shell
            .owner
            .run_until(|| handle.is_finished(), Duration::from_millis(5));
        handle.join().unwrap();

        let labels: Vec<_> = shell.nav.nodes().into_iter().map(|n| n.label).collect();
        assert_eq!(labels, vec!["Inbox (3)", "Buy milk (2)", "Write paper (1)"]);
    }

    #[test]
    fn tick_after_pump_keeps_selection_valid() {
        let shell = Shell::start(&NavConfig::default()).unwrap();
        shell.model.load().unwrap();
        let mut app = TuiApp::new(&shell.bus, shell.model.clone(), shell.nav.clone(), 8).unwrap();
        app.selected = 10;
        app.update(TuiMessage::Tick);
        assert_eq!(app.selected, 0);
    }
}

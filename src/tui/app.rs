//! TuiApp — the TEA model.
//!
//! Holds the view-side state (selection, input mode, status line) plus
//! handles to the model and the navigation controller. Keys become model
//! commands; the model publishes, the controller patches the tree, and
//! the next frame shows it. Nothing here edits tree nodes directly.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::warn;
use tui_tree_widget::TreeState;

use crate::bus::{BusResult, EventBus, MessageKind};
use crate::model::{ClientModel, Perspective, ProjectId};
use crate::nav::{NavigationController, NavigationTree};

use super::event::TuiMessage;
use super::panes::{ActivityLog, DetailPane};

/// What a text entry will create once submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Thought,
    Project,
    Action,
}

impl EntryKind {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Thought => "Capture thought",
            Self::Project => "Define project",
            Self::Action => "Add action",
        }
    }
}

/// Current input mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Entry { kind: EntryKind, buffer: String },
}

/// Status bar content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    Info(String),
    Error(String),
}

/// The main TUI application state (TEA model).
pub struct TuiApp {
    pub model: Arc<ClientModel>,
    pub nav: Arc<NavigationController<NavigationTree>>,
    pub activity: Arc<ActivityLog>,
    pub detail: Arc<DetailPane>,
    pub tree_state: TreeState<String>,
    pub selected: usize,
    pub input_mode: InputMode,
    pub status: Status,
    pub should_quit: bool,
}

impl TuiApp {
    /// Build the app and subscribe its panes. The bus only holds weak
    /// references to them.
    pub fn new(
        bus: &EventBus,
        model: Arc<ClientModel>,
        nav: Arc<NavigationController<NavigationTree>>,
        activity_capacity: usize,
    ) -> BusResult<Self> {
        let activity = Arc::new(ActivityLog::new(activity_capacity));
        let detail = Arc::new(DetailPane::new());
        for kind in MessageKind::ALL {
            bus.subscribe(kind, Arc::downgrade(&activity))?;
        }
        for kind in DetailPane::KINDS {
            bus.subscribe(kind, Arc::downgrade(&detail))?;
        }

        let mut app = Self {
            model,
            nav,
            activity,
            detail,
            tree_state: TreeState::default(),
            selected: 0,
            input_mode: InputMode::Normal,
            status: Status::Ready,
            should_quit: false,
        };
        app.sync_selection();
        Ok(app)
    }

    /// Handle a TUI message (TEA update).
    pub fn update(&mut self, msg: TuiMessage) {
        match msg {
            TuiMessage::Input(key) => super::input::handle_key(self, key),
            TuiMessage::Tick => self.sync_selection(),
            TuiMessage::Quit => self.should_quit = true,
        }
    }

    /// Key of the highlighted node.
    pub fn selected_key(&self) -> Option<String> {
        self.nav.nodes().get(self.selected).map(|n| n.key.clone())
    }

    /// Clamp the selection to the current node list and mirror it into
    /// the tree widget state.
    pub fn sync_selection(&mut self) {
        let len = self.nav.nodes().len();
        if len == 0 {
            self.selected = 0;
            self.tree_state.select(Vec::new());
            return;
        }
        self.selected = self.selected.min(len - 1);
        if let Some(key) = self.selected_key() {
            self.tree_state.select(vec![key]);
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.sync_selection();
    }

    pub fn move_down(&mut self) {
        self.selected = self.selected.saturating_add(1);
        self.sync_selection();
    }

    /// Open the highlighted node in the detail pane.
    pub fn select_current(&mut self) {
        self.run(|app| {
            let key = app.selected_key().ok_or_else(|| anyhow!("nothing to select"))?;
            app.nav.when_node_selected(&key)?;
            Ok(format!("opened {key}"))
        });
    }

    pub fn begin_entry(&mut self, kind: EntryKind) {
        if kind == EntryKind::Action && self.detail.shown_project().is_none() {
            self.status = Status::Error("open a project first".into());
            return;
        }
        self.input_mode = InputMode::Entry {
            kind,
            buffer: String::new(),
        };
    }

    pub fn cancel_entry(&mut self) {
        self.input_mode = InputMode::Normal;
        self.status = Status::Ready;
    }

    pub fn push_char(&mut self, c: char) {
        if let InputMode::Entry { buffer, .. } = &mut self.input_mode {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let InputMode::Entry { buffer, .. } = &mut self.input_mode {
            buffer.pop();
        }
    }

    /// Submit the entry buffer as a new thought, project or action.
    pub fn submit_entry(&mut self) {
        let InputMode::Entry { kind, buffer } =
            std::mem::replace(&mut self.input_mode, InputMode::Normal)
        else {
            return;
        };
        self.run(move |app| match kind {
            EntryKind::Thought => {
                app.model.capture_thought(buffer.as_str())?;
                Ok(format!("captured \"{}\"", buffer.trim()))
            }
            EntryKind::Project => {
                app.model.define_project(buffer.as_str())?;
                Ok(format!("defined \"{}\"", buffer.trim()))
            }
            EntryKind::Action => {
                let project = app.shown_project()?;
                app.model.add_action(project, buffer.as_str())?;
                Ok(format!("added \"{}\"", buffer.trim()))
            }
        });
    }

    /// Move the oldest inbox thought into the displayed project.
    pub fn move_oldest_thought(&mut self) {
        self.run(|app| {
            let project = app.shown_project()?;
            let thought = app
                .model
                .list_inbox()
                .into_iter()
                .next()
                .context("inbox is empty")?;
            app.model.move_thought_to_project(thought.id, project)?;
            Ok(format!("moved \"{}\"", thought.subject))
        });
    }

    pub fn archive_oldest_thought(&mut self) {
        self.run(|app| {
            let thought = app
                .model
                .list_inbox()
                .into_iter()
                .next()
                .context("inbox is empty")?;
            app.model.archive_thought(thought.id)?;
            Ok(format!("archived \"{}\"", thought.subject))
        });
    }

    /// Move every inbox thought into the displayed project.
    pub fn move_whole_inbox(&mut self) {
        self.run(|app| {
            let project = app.shown_project()?;
            let ids: Vec<_> = app.model.list_inbox().iter().map(|t| t.id).collect();
            if ids.is_empty() {
                anyhow::bail!("inbox is empty");
            }
            let moved = app.model.move_thoughts_to_project(&ids, project)?;
            Ok(format!("moved {} thoughts", moved.len()))
        });
    }

    pub fn archive_whole_inbox(&mut self) {
        self.run(|app| {
            let ids: Vec<_> = app.model.list_inbox().iter().map(|t| t.id).collect();
            if ids.is_empty() {
                anyhow::bail!("inbox is empty");
            }
            app.model.archive_thoughts(&ids)?;
            Ok(format!("archived {} thoughts", ids.len()))
        });
    }

    /// Complete the first remaining action of the displayed project.
    pub fn complete_next_action(&mut self) {
        self.run(|app| {
            let project = app.shown_project()?;
            let view = app
                .model
                .get_project(project)
                .context("project no longer exists")?;
            let action = view
                .actions
                .into_iter()
                .find(|a| !a.completed)
                .context("no remaining actions")?;
            app.model.complete_action(project, action.id)?;
            Ok(format!("completed \"{}\"", action.outcome))
        });
    }

    pub fn cycle_filter(&mut self) {
        self.run(|app| {
            let next = app.model.current_filter().next();
            app.model.set_filter(next)?;
            Ok(format!("filter: {next}"))
        });
    }

    fn shown_project(&self) -> anyhow::Result<ProjectId> {
        self.detail
            .shown_project()
            .context("open a project first")
    }

    /// Run a command and put its outcome on the status line.
    fn run(&mut self, command: impl FnOnce(&mut Self) -> anyhow::Result<String>) {
        self.status = match command(self) {
            Ok(done) => Status::Info(done),
            Err(e) => {
                warn!("command failed: {e:#}");
                Status::Error(format!("{e:#}"))
            }
        };
        self.sync_selection();
    }
}

//! Bus-driven panes beside the navigation tree.
//!
//! Both panes are bus handlers and may be called from any publishing
//! thread, so their state sits behind a mutex. The renderer copies it
//! out once per frame.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::bus::{Handler, Message, MessageKind};
use crate::model::{Perspective, ProjectId};
use crate::nav::NodeTarget;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A single line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    pub kind: MessageKind,
    pub summary: String,
}

/// Ring buffer of every message seen on the bus.
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, entry: ActivityEntry) {
        let mut entries = lock(&self.entries);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        lock(&self.entries).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Handler for ActivityLog {
    fn handle(&self, message: &Message) -> anyhow::Result<()> {
        self.push(ActivityEntry {
            timestamp: now_secs(),
            kind: message.kind(),
            summary: message.summary(),
        });
        Ok(())
    }
}

/// Shows whatever the last display intent asked for.
#[derive(Default)]
pub struct DetailPane {
    shown: Mutex<Option<NodeTarget>>,
}

impl DetailPane {
    pub const KINDS: [MessageKind; 2] = [MessageKind::DisplayInbox, MessageKind::DisplayProject];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Option<NodeTarget> {
        *lock(&self.shown)
    }

    pub fn shown_project(&self) -> Option<ProjectId> {
        match self.shown() {
            Some(NodeTarget::Project(id)) => Some(id),
            _ => None,
        }
    }

    /// Title and body lines for the current target.
    pub fn render_lines(&self, view: &dyn Perspective) -> (String, Vec<String>) {
        match self.shown() {
            None => (
                "Detail".into(),
                vec!["Select a node and press Enter.".into()],
            ),
            Some(NodeTarget::Inbox) => {
                let inbox = view.list_inbox();
                let mut lines: Vec<String> =
                    inbox.iter().map(|t| format!("- {}", t.subject)).collect();
                if lines.is_empty() {
                    lines.push("Inbox is empty.".into());
                }
                (format!("Inbox ({})", inbox.len()), lines)
            }
            Some(NodeTarget::Project(id)) => match view.get_project(id) {
                None => ("Detail".into(), vec![format!("Project {id} is gone.")]),
                Some(project) => {
                    let filter = view.current_filter();
                    let mut lines: Vec<String> = filter
                        .filter_actions(&project)
                        .into_iter()
                        .map(|a| {
                            let mark = if a.completed { 'x' } else { ' ' };
                            format!("[{mark}] {}", a.outcome)
                        })
                        .collect();
                    if lines.is_empty() {
                        lines.push("Nothing to show.".into());
                    }
                    (format!("{} [{}]", project.outcome, filter.title()), lines)
                }
            },
        }
    }
}

impl Handler for DetailPane {
    fn handle(&self, message: &Message) -> anyhow::Result<()> {
        let target = match message {
            Message::DisplayInbox => NodeTarget::Inbox,
            Message::DisplayProject { project_id } => NodeTarget::Project(*project_id),
            _ => return Ok(()),
        };
        *lock(&self.shown) = Some(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::model::{ActionFilter, ClientModel};
    use std::sync::Arc;

    #[test]
    fn activity_ring_buffer_caps() {
        let log = ActivityLog::new(4);
        for i in 0..10 {
            log.push(ActivityEntry {
                timestamp: i,
                kind: MessageKind::AppInit,
                summary: format!("entry-{i}"),
            });
        }
        let entries = log.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].summary, "entry-6");
        assert_eq!(entries[3].summary, "entry-9");
    }

    #[test]
    fn activity_records_message_summary() {
        let log = ActivityLog::new(8);
        log.handle(&Message::FilterChanged {
            filter: ActionFilter::All,
        })
        .unwrap();
        let entries = log.entries();
        assert_eq!(entries[0].kind, MessageKind::FilterChanged);
        assert_eq!(entries[0].summary, "filter changed: All actions");
    }

    #[test]
    fn detail_pane_follows_display_intents() {
        let pane = DetailPane::new();
        assert_eq!(pane.shown(), None);

        pane.handle(&Message::DisplayInbox).unwrap();
        assert_eq!(pane.shown(), Some(NodeTarget::Inbox));

        let id = ProjectId::new();
        pane.handle(&Message::DisplayProject { project_id: id }).unwrap();
        assert_eq!(pane.shown_project(), Some(id));

        // Other kinds leave it alone.
        pane.handle(&Message::AppInit).unwrap();
        assert_eq!(pane.shown_project(), Some(id));
    }

    #[test]
    fn detail_lines_use_current_filter() {
        let model = ClientModel::new(Arc::new(EventBus::new()));
        let project = model.define_project("Garden").unwrap();
        let seeds = model.add_action(project, "buy seeds").unwrap();
        model.add_action(project, "dig beds").unwrap();
        model.complete_action(project, seeds).unwrap();

        let pane = DetailPane::new();
        pane.handle(&Message::DisplayProject {
            project_id: project,
        })
        .unwrap();

        let (title, lines) = pane.render_lines(&model);
        assert_eq!(title, "Garden [Remaining actions]");
        assert_eq!(lines, vec!["[ ] dig beds".to_string()]);

        model.set_filter(ActionFilter::Completed).unwrap();
        let (_, lines) = pane.render_lines(&model);
        assert_eq!(lines, vec!["[x] buy seeds".to_string()]);
    }

    #[test]
    fn detail_lines_for_inbox() {
        let model = ClientModel::new(Arc::new(EventBus::new()));
        let pane = DetailPane::new();
        pane.handle(&Message::DisplayInbox).unwrap();
        assert_eq!(pane.render_lines(&model).1, vec!["Inbox is empty.".to_string()]);

        model.capture_thought("call mom").unwrap();
        let (title, lines) = pane.render_lines(&model);
        assert_eq!(title, "Inbox (1)");
        assert_eq!(lines, vec!["- call mom".to_string()]);
    }
}

//! Bus messages — domain occurrences and UI intents.
//!
//! Messages carry identifiers and primitive fields only. They are values:
//! cloned freely, never mutated after construction.

use std::fmt;

use crate::model::{ActionFilter, ActionId, ProjectId, ThoughtId};

/// Everything that can travel on the event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// The application shell finished wiring.
    AppInit,
    /// The main form finished loading.
    FormLoaded,
    /// The client model finished its initial load.
    ClientModelLoaded,
    /// A thought landed in the inbox.
    ThoughtCaptured { thought_id: ThoughtId, subject: String },
    /// A thought left the inbox.
    ThoughtArchived { thought_id: ThoughtId },
    /// A new project was defined.
    ProjectDefined { project_id: ProjectId, outcome: String },
    /// An action was added to a project.
    ActionAdded {
        project_id: ProjectId,
        action_id: ActionId,
        outcome: String,
    },
    /// An existing action changed (e.g. completed).
    ActionUpdated {
        project_id: ProjectId,
        action_id: ActionId,
    },
    /// The active action filter changed.
    FilterChanged { filter: ActionFilter },
    /// Intent: show the inbox.
    DisplayInbox,
    /// Intent: show one project.
    DisplayProject { project_id: ProjectId },
}

/// Subscription key. One tag per `Message` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    AppInit,
    FormLoaded,
    ClientModelLoaded,
    ThoughtCaptured,
    ThoughtArchived,
    ProjectDefined,
    ActionAdded,
    ActionUpdated,
    FilterChanged,
    DisplayInbox,
    DisplayProject,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [MessageKind; 11] = [
        Self::AppInit,
        Self::FormLoaded,
        Self::ClientModelLoaded,
        Self::ThoughtCaptured,
        Self::ThoughtArchived,
        Self::ProjectDefined,
        Self::ActionAdded,
        Self::ActionUpdated,
        Self::FilterChanged,
        Self::DisplayInbox,
        Self::DisplayProject,
    ];
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Message {
    /// The subscription key this message is delivered under.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::AppInit => MessageKind::AppInit,
            Self::FormLoaded => MessageKind::FormLoaded,
            Self::ClientModelLoaded => MessageKind::ClientModelLoaded,
            Self::ThoughtCaptured { .. } => MessageKind::ThoughtCaptured,
            Self::ThoughtArchived { .. } => MessageKind::ThoughtArchived,
            Self::ProjectDefined { .. } => MessageKind::ProjectDefined,
            Self::ActionAdded { .. } => MessageKind::ActionAdded,
            Self::ActionUpdated { .. } => MessageKind::ActionUpdated,
            Self::FilterChanged { .. } => MessageKind::FilterChanged,
            Self::DisplayInbox => MessageKind::DisplayInbox,
            Self::DisplayProject { .. } => MessageKind::DisplayProject,
        }
    }

    /// One-line human summary (activity log).
    pub fn summary(&self) -> String {
        match self {
            Self::AppInit => "app initialized".into(),
            Self::FormLoaded => "form loaded".into(),
            Self::ClientModelLoaded => "client model loaded".into(),
            Self::ThoughtCaptured { subject, .. } => format!("thought captured: {subject}"),
            Self::ThoughtArchived { thought_id } => format!("thought archived: {thought_id}"),
            Self::ProjectDefined { outcome, .. } => format!("project defined: {outcome}"),
            Self::ActionAdded { outcome, .. } => format!("action added: {outcome}"),
            Self::ActionUpdated { action_id, .. } => format!("action updated: {action_id}"),
            Self::FilterChanged { filter } => format!("filter changed: {filter}"),
            Self::DisplayInbox => "display inbox".into(),
            Self::DisplayProject { project_id } => format!("display project: {project_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let id = ProjectId::new();
        assert_eq!(Message::AppInit.kind(), MessageKind::AppInit);
        assert_eq!(
            Message::ProjectDefined {
                project_id: id,
                outcome: "x".into()
            }
            .kind(),
            MessageKind::ProjectDefined
        );
        assert_eq!(
            Message::DisplayProject { project_id: id }.kind(),
            MessageKind::DisplayProject
        );
    }

    #[test]
    fn all_kinds_distinct() {
        let mut kinds = MessageKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), MessageKind::ALL.len());
    }

    #[test]
    fn summary_mentions_subject() {
        let msg = Message::ThoughtCaptured {
            thought_id: ThoughtId::new(),
            subject: "call mom".into(),
        };
        assert!(msg.summary().contains("call mom"));
    }
}

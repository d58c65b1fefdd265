//! Domain identifiers and read-side views.
//!
//! Views are lightweight copies handed out by the Perspective. Nothing
//! outside the model ever holds a reference into model state.

use std::fmt;

use uuid::Uuid;

macro_rules! domain_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

domain_id!(
    /// An unprocessed inbox item.
    ThoughtId
);
domain_id!(
    /// A project (desired outcome).
    ProjectId
);
domain_id!(
    /// A next physical step within a project.
    ActionId
);

/// Inbox item as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThoughtView {
    pub id: ThoughtId,
    pub subject: String,
}

/// Action as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionView {
    pub id: ActionId,
    pub outcome: String,
    pub completed: bool,
}

/// Project as seen by readers, actions in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectView {
    pub id: ProjectId,
    pub outcome: String,
    pub actions: Vec<ActionView>,
}

/// Navigation key of a project's node. Stable for the project's lifetime.
pub fn project_key(id: ProjectId) -> String {
    format!("project-{id}")
}

//! Client model — the GTD domain as seen by the navigation core.
//!
//! `Perspective` is the read side every consumer queries. `ClientModel`
//! is the in-memory implementation: it owns thoughts, projects and
//! actions, and publishes a bus message for every change it makes.

pub mod client;
pub mod error;
pub mod filter;
pub mod types;

pub use client::ClientModel;
pub use error::{ModelError, ModelResult};
pub use filter::ActionFilter;
pub use types::{
    project_key, ActionId, ActionView, ProjectId, ProjectView, ThoughtId, ThoughtView,
};

/// Read-only, point-in-time queries over the domain.
///
/// Implementations must reflect state as of the call. Callers never cache
/// results across messages.
pub trait Perspective: Send + Sync {
    /// Inbox contents, oldest first.
    fn list_inbox(&self) -> Vec<ThoughtView>;
    /// All projects, in definition order.
    fn list_projects(&self) -> Vec<ProjectView>;
    fn get_project(&self, id: ProjectId) -> Option<ProjectView>;
    /// The filter that decides which actions count.
    fn current_filter(&self) -> ActionFilter;
}

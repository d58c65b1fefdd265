//! Model-specific error types.

use thiserror::Error;

use super::types::{ActionId, ProjectId, ThoughtId};
use crate::bus::BusError;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("thought not in inbox: {0}")]
    UnknownThought(ThoughtId),

    #[error("project not found: {0}")]
    UnknownProject(ProjectId),

    #[error("action {action} not found in project {project}")]
    UnknownAction { project: ProjectId, action: ActionId },

    #[error("empty {0}")]
    Empty(&'static str),

    #[error("notification failed: {0}")]
    Bus(#[from] BusError),
}

pub type ModelResult<T> = Result<T, ModelError>;

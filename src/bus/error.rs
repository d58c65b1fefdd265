//! Bus-specific error types.

use std::fmt;

use thiserror::Error;

use super::message::MessageKind;
use super::SubscriptionToken;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("invalid handler for {kind}: handler reference is gone")]
    InvalidHandler { kind: MessageKind },

    #[error("{} handler(s) failed for {kind}: {}", .failures.len(), join_failures(.failures))]
    HandlerFailure {
        kind: MessageKind,
        failures: Vec<HandlerFailure>,
    },
}

/// One subscriber's failure during a publish round.
#[derive(Debug)]
pub struct HandlerFailure {
    pub token: SubscriptionToken,
    pub error: anyhow::Error,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.token, self.error)
    }
}

fn join_failures(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl BusError {
    /// Failures carried by a `HandlerFailure`, empty otherwise.
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            Self::HandlerFailure { failures, .. } => failures,
            Self::InvalidHandler { .. } => &[],
        }
    }
}

pub type BusResult<T> = Result<T, BusError>;

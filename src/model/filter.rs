//! Action filters — which actions count toward a project's displayed number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::{ActionView, ProjectView};

/// Predicate plus count-format policy applied to a project's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionFilter {
    All,
    #[default]
    Remaining,
    Completed,
}

impl ActionFilter {
    /// Every filter, in cycling order.
    pub const ALL: [ActionFilter; 3] = [Self::All, Self::Remaining, Self::Completed];

    /// Actions of `project` visible under this filter.
    pub fn filter_actions<'a>(&self, project: &'a ProjectView) -> Vec<&'a ActionView> {
        project
            .actions
            .iter()
            .filter(|a| match self {
                Self::All => true,
                Self::Remaining => !a.completed,
                Self::Completed => a.completed,
            })
            .collect()
    }

    /// Display text for `n` visible actions.
    pub fn format_action_count(&self, n: usize) -> String {
        match self {
            Self::All | Self::Remaining => n.to_string(),
            Self::Completed => format!("{n} done"),
        }
    }

    /// Next filter in cycling order (wraps).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::All => "All actions",
            Self::Remaining => "Remaining actions",
            Self::Completed => "Completed actions",
        }
    }
}

impl fmt::Display for ActionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ActionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "remaining" => Ok(Self::Remaining),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!(
                "unknown filter '{other}' (expected all, remaining or completed)"
            )),
        }
    }
}

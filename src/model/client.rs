//! In-memory client model.
//!
//! Every mutation follows the same shape: change state under the write
//! lock, release it, then publish. Handlers run synchronously inside
//! `publish` and query this model, so the lock must be free by then.
//! A publish error does not roll the change back; it reports consumers
//! that failed to react.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::error::{ModelError, ModelResult};
use super::filter::ActionFilter;
use super::types::{ActionId, ActionView, ProjectId, ProjectView, ThoughtId, ThoughtView};
use super::Perspective;
use crate::bus::{EventBus, Message};

#[derive(Debug, Default)]
struct ModelState {
    inbox: Vec<ThoughtView>,
    projects: Vec<ProjectView>,
    filter: ActionFilter,
}

impl ModelState {
    fn project_mut(&mut self, id: ProjectId) -> ModelResult<&mut ProjectView> {
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ModelError::UnknownProject(id))
    }

    /// Check every id before removing any; a repeated id counts as unknown.
    fn check_thoughts(&self, ids: &[ThoughtId]) -> ModelResult<()> {
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) || !self.inbox.iter().any(|t| t.id == *id) {
                return Err(ModelError::UnknownThought(*id));
            }
        }
        Ok(())
    }

    fn take_thoughts(&mut self, ids: &[ThoughtId]) -> Vec<ThoughtView> {
        let mut taken = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(pos) = self.inbox.iter().position(|t| t.id == *id) {
                taken.push(self.inbox.remove(pos));
            }
        }
        taken
    }
}

pub struct ClientModel {
    state: RwLock<ModelState>,
    bus: Arc<EventBus>,
}

fn non_empty(text: impl Into<String>, what: &'static str) -> ModelResult<String> {
    let text = text.into().trim().to_string();
    if text.is_empty() {
        return Err(ModelError::Empty(what));
    }
    Ok(text)
}

impl ClientModel {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self::with_filter(bus, ActionFilter::default())
    }

    pub fn with_filter(bus: Arc<EventBus>, filter: ActionFilter) -> Self {
        Self {
            state: RwLock::new(ModelState {
                filter,
                ..ModelState::default()
            }),
            bus,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, message: Message) -> ModelResult<()> {
        debug!(kind = %message.kind(), "model notify");
        self.bus.publish(message)?;
        Ok(())
    }

    /// Announce that the model is ready to be read.
    pub fn load(&self) -> ModelResult<()> {
        self.notify(Message::ClientModelLoaded)
    }

    /// Drop a new thought into the inbox.
    pub fn capture_thought(&self, subject: impl Into<String>) -> ModelResult<ThoughtId> {
        let subject = non_empty(subject, "thought subject")?;
        let id = ThoughtId::new();
        self.write().inbox.push(ThoughtView {
            id,
            subject: subject.clone(),
        });
        self.notify(Message::ThoughtCaptured {
            thought_id: id,
            subject,
        })?;
        Ok(id)
    }

    /// Remove a thought from the inbox without acting on it.
    pub fn archive_thought(&self, id: ThoughtId) -> ModelResult<()> {
        self.archive_thoughts(&[id])
    }

    /// Archive several thoughts at once. Nothing is removed unless every id
    /// is in the inbox.
    pub fn archive_thoughts(&self, ids: &[ThoughtId]) -> ModelResult<()> {
        let archived = {
            let mut state = self.write();
            state.check_thoughts(ids)?;
            state.take_thoughts(ids)
        };
        for thought in archived {
            self.notify(Message::ThoughtArchived {
                thought_id: thought.id,
            })?;
        }
        Ok(())
    }

    /// Turn a thought into an action of `project`.
    pub fn move_thought_to_project(
        &self,
        thought: ThoughtId,
        project: ProjectId,
    ) -> ModelResult<ActionId> {
        self.move_thoughts_to_project(&[thought], project)?
            .pop()
            .ok_or(ModelError::UnknownThought(thought))
    }

    /// Turn several thoughts into actions of `project`, in the given order.
    /// Nothing moves unless the project and every thought exist.
    pub fn move_thoughts_to_project(
        &self,
        thoughts: &[ThoughtId],
        project: ProjectId,
    ) -> ModelResult<Vec<ActionId>> {
        let moved: Vec<(ThoughtId, ActionId, String)> = {
            let mut state = self.write();
            state.check_thoughts(thoughts)?;
            state.project_mut(project)?;
            let moved: Vec<_> = state
                .take_thoughts(thoughts)
                .into_iter()
                .map(|t| (t.id, ActionId::new(), t.subject))
                .collect();
            let target = state.project_mut(project)?;
            for (_, action_id, outcome) in &moved {
                target.actions.push(ActionView {
                    id: *action_id,
                    outcome: outcome.clone(),
                    completed: false,
                });
            }
            moved
        };

        let mut actions = Vec::with_capacity(moved.len());
        for (thought_id, action_id, outcome) in moved {
            self.notify(Message::ThoughtArchived { thought_id })?;
            self.notify(Message::ActionAdded {
                project_id: project,
                action_id,
                outcome,
            })?;
            actions.push(action_id);
        }
        Ok(actions)
    }

    /// Define a new project with the given outcome.
    pub fn define_project(&self, outcome: impl Into<String>) -> ModelResult<ProjectId> {
        let outcome = non_empty(outcome, "project outcome")?;
        let id = ProjectId::new();
        self.write().projects.push(ProjectView {
            id,
            outcome: outcome.clone(),
            actions: Vec::new(),
        });
        self.notify(Message::ProjectDefined {
            project_id: id,
            outcome,
        })?;
        Ok(id)
    }

    /// Append an action to a project.
    pub fn add_action(
        &self,
        project: ProjectId,
        outcome: impl Into<String>,
    ) -> ModelResult<ActionId> {
        let outcome = non_empty(outcome, "action outcome")?;
        let action_id = ActionId::new();
        self.write().project_mut(project)?.actions.push(ActionView {
            id: action_id,
            outcome: outcome.clone(),
            completed: false,
        });
        self.notify(Message::ActionAdded {
            project_id: project,
            action_id,
            outcome,
        })?;
        Ok(action_id)
    }

    /// Mark an action done.
    pub fn complete_action(&self, project: ProjectId, action: ActionId) -> ModelResult<()> {
        {
            let mut state = self.write();
            let found = state
                .project_mut(project)?
                .actions
                .iter_mut()
                .find(|a| a.id == action)
                .ok_or(ModelError::UnknownAction { project, action })?;
            found.completed = true;
        }
        self.notify(Message::ActionUpdated {
            project_id: project,
            action_id: action,
        })
    }

    /// Switch the active action filter.
    pub fn set_filter(&self, filter: ActionFilter) -> ModelResult<()> {
        self.write().filter = filter;
        self.notify(Message::FilterChanged { filter })
    }
}

impl Perspective for ClientModel {
    fn list_inbox(&self) -> Vec<ThoughtView> {
        self.read().inbox.clone()
    }

    fn list_projects(&self) -> Vec<ProjectView> {
        self.read().projects.clone()
    }

    fn get_project(&self, id: ProjectId) -> Option<ProjectView> {
        self.read().projects.iter().find(|p| p.id == id).cloned()
    }

    fn current_filter(&self) -> ActionFilter {
        self.read().filter
    }
}

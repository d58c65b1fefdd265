//! Navigation controller — keeps the navigation tree in step with the model.
//!
//! Reacts to bus messages only. The whole tree is rebuilt on load and on
//! filter change; every other message patches exactly the nodes it
//! affects. All node writes happen inside `AffinityDispatcher::run`, so
//! the bus delivery thread never touches the surface directly.
//!
//! ```text
//! Unloaded ──FormLoaded / ClientModelLoaded──▶ Loaded
//!    │  AppInit: register dock                  │  thoughts, projects,
//!    │  everything else: ignored                │  actions, filter: patch / reload
//! ```

pub mod tree;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info};

use crate::bus::{BusError, EventBus, Handler, Message, MessageKind, SubscriptionToken};
use crate::config::NavigationConfig;
use crate::dispatch::{AffinityDispatcher, DispatchError};
use crate::model::{ActionFilter, Perspective, ProjectId, ProjectView};

pub use tree::{DisplaySurface, NavigationTree, TreeNode};

/// Key of the inbox node.
pub const INBOX_KEY: &str = "inbox";

/// Message kinds the controller listens to.
pub const SUBSCRIBED_KINDS: [MessageKind; 9] = [
    MessageKind::AppInit,
    MessageKind::FormLoaded,
    MessageKind::ClientModelLoaded,
    MessageKind::ThoughtCaptured,
    MessageKind::ThoughtArchived,
    MessageKind::ProjectDefined,
    MessageKind::ActionAdded,
    MessageKind::ActionUpdated,
    MessageKind::FilterChanged,
];

#[derive(Debug, Error)]
pub enum NavError {
    #[error("unknown node key: {0}")]
    UnknownNodeKey(String),

    #[error("project not visible in perspective: {0}")]
    UnknownProject(ProjectId),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

pub type NavResult<T> = Result<T, NavError>;

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTarget {
    Inbox,
    Project(ProjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unloaded,
    Loaded,
}

/// Node label for a project: `"<outcome> (<count>)"`, or the bare outcome
/// when there is no count to show.
pub fn project_label(outcome: &str, count: Option<&str>) -> String {
    match count {
        Some(count) if !count.is_empty() => format!("{outcome} ({count})"),
        _ => outcome.to_string(),
    }
}

fn filtered_count(filter: ActionFilter, project: &ProjectView) -> String {
    filter.format_action_count(filter.filter_actions(project).len())
}

/// Everything only the owning thread may touch.
struct NavState<S> {
    surface: S,
    nodes: HashMap<String, NodeTarget>,
    phase: Phase,
}

impl<S: DisplaySurface> NavState<S> {
    fn reload(&mut self, view: &dyn Perspective, options: &NavigationConfig) {
        self.surface.clear();
        self.nodes.clear();
        self.reload_inbox(view, options);

        let filter = view.current_filter();
        let projects = view.list_projects();
        for project in &projects {
            let count = filtered_count(filter, project);
            self.upsert_project(project.id, &project.outcome, Some(&count));
        }
        info!(projects = projects.len(), %filter, "navigation reloaded");
    }

    fn reload_inbox(&mut self, view: &dyn Perspective, options: &NavigationConfig) {
        let label = format!("{} ({})", options.inbox_label, view.list_inbox().len());
        self.surface.add_or_update_node(INBOX_KEY, &label);
        self.nodes.insert(INBOX_KEY.to_string(), NodeTarget::Inbox);
    }

    fn upsert_project(&mut self, id: ProjectId, outcome: &str, count: Option<&str>) {
        let key = crate::model::project_key(id);
        self.surface.add_or_update_node(&key, &project_label(outcome, count));
        self.nodes.insert(key, NodeTarget::Project(id));
    }
}

/// The reconciling controller. Create with [`NavigationController::wire`].
pub struct NavigationController<S> {
    state: Arc<Mutex<NavState<S>>>,
    dispatcher: AffinityDispatcher,
    perspective: Arc<dyn Perspective>,
    bus: Arc<EventBus>,
    options: Arc<NavigationConfig>,
    tokens: Mutex<Vec<SubscriptionToken>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: DisplaySurface + Send + 'static> NavigationController<S> {
    /// Build the controller and subscribe it to every kind it handles.
    ///
    /// The bus only holds weak references; the returned `Arc` keeps the
    /// subscriptions alive. Dropping it unsubscribes.
    pub fn wire(
        bus: Arc<EventBus>,
        dispatcher: AffinityDispatcher,
        perspective: Arc<dyn Perspective>,
        surface: S,
        options: NavigationConfig,
    ) -> NavResult<Arc<Self>> {
        let controller = Arc::new(Self {
            state: Arc::new(Mutex::new(NavState {
                surface,
                nodes: HashMap::new(),
                phase: Phase::Unloaded,
            })),
            dispatcher,
            perspective,
            bus: bus.clone(),
            options: Arc::new(options),
            tokens: Mutex::new(Vec::new()),
        });

        let weak = Arc::downgrade(&controller);
        let mut tokens = Vec::with_capacity(SUBSCRIBED_KINDS.len());
        for kind in SUBSCRIBED_KINDS {
            tokens.push(bus.subscribe(kind, weak.clone())?);
        }
        *lock(&controller.tokens) = tokens;
        debug!("navigation controller wired");
        Ok(controller)
    }

    /// Run `f` against the owned state on the owning thread.
    fn apply<F, R>(&self, f: F) -> NavResult<R>
    where
        F: FnOnce(&mut NavState<S>, &dyn Perspective, &NavigationConfig) -> R + Send + 'static,
        R: Send + 'static,
    {
        let state = self.state.clone();
        let perspective = self.perspective.clone();
        let options = self.options.clone();
        let result = self.dispatcher.run(move || {
            let mut state = lock(&state);
            f(&mut *state, perspective.as_ref(), &options)
        })?;
        Ok(result)
    }

    fn on_app_init(&self) -> NavResult<()> {
        self.apply(|state, _, options| {
            state.surface.register_dock(&options.dock);
            state.surface.switch_to(&options.dock);
        })
    }

    fn on_loaded(&self) -> NavResult<()> {
        self.load_navigation()
    }

    fn on_inbox_changed(&self) -> NavResult<()> {
        self.apply(|state, view, options| {
            if state.phase == Phase::Loaded {
                state.reload_inbox(view, options);
            }
        })
    }

    fn on_project_defined(&self, id: ProjectId, outcome: String) -> NavResult<()> {
        self.apply(move |state, view, _| {
            if state.phase != Phase::Loaded {
                return;
            }
            let count = view
                .get_project(id)
                .map(|p| filtered_count(view.current_filter(), &p));
            state.upsert_project(id, &outcome, count.as_deref());
        })
    }

    fn on_action_changed(&self, id: ProjectId) -> NavResult<()> {
        self.apply(move |state, view, _| -> NavResult<()> {
            if state.phase != Phase::Loaded {
                return Ok(());
            }
            let project = view.get_project(id).ok_or(NavError::UnknownProject(id))?;
            let count = filtered_count(view.current_filter(), &project);
            state.upsert_project(id, &project.outcome, Some(&count));
            Ok(())
        })?
    }

    fn on_filter_changed(&self) -> NavResult<()> {
        self.apply(|state, view, options| {
            if state.phase == Phase::Loaded {
                state.reload(view, options);
            }
        })
    }

    /// Rebuild the whole tree from the perspective and start tracking
    /// incremental changes.
    pub fn load_navigation(&self) -> NavResult<()> {
        self.apply(|state, view, options| {
            state.phase = Phase::Loaded;
            state.reload(view, options);
        })
    }

    /// Resolve a selected node and publish the matching display intent.
    pub fn when_node_selected(&self, key: &str) -> NavResult<()> {
        if key == INBOX_KEY {
            debug!(key, "node selected");
            self.bus.publish(Message::DisplayInbox)?;
            return Ok(());
        }
        let lookup = key.to_string();
        let target = self.apply(move |state, _, _| state.nodes.get(&lookup).copied())?;
        let intent = match target {
            Some(NodeTarget::Inbox) => Message::DisplayInbox,
            Some(NodeTarget::Project(project_id)) => Message::DisplayProject { project_id },
            None => return Err(NavError::UnknownNodeKey(key.to_string())),
        };
        debug!(key, "node selected");
        self.bus.publish(intent)?;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    /// What the node under `key` stands for.
    pub fn node_target(&self, key: &str) -> Option<NodeTarget> {
        lock(&self.state).nodes.get(key).copied()
    }

    /// Keys currently mapped, sorted.
    pub fn node_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = lock(&self.state).nodes.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Read-only access to the surface (rendering, inspection).
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&lock(&self.state).surface)
    }
}

impl<S: DisplaySurface + Send + 'static> Handler for NavigationController<S> {
    fn handle(&self, message: &Message) -> anyhow::Result<()> {
        match message {
            Message::AppInit => self.on_app_init()?,
            Message::FormLoaded | Message::ClientModelLoaded => self.on_loaded()?,
            Message::ThoughtCaptured { .. } | Message::ThoughtArchived { .. } => {
                self.on_inbox_changed()?
            }
            Message::ProjectDefined {
                project_id,
                outcome,
            } => self.on_project_defined(*project_id, outcome.clone())?,
            Message::ActionAdded { project_id, .. } | Message::ActionUpdated { project_id, .. } => {
                self.on_action_changed(*project_id)?
            }
            Message::FilterChanged { .. } => self.on_filter_changed()?,
            Message::DisplayInbox | Message::DisplayProject { .. } => {}
        }
        Ok(())
    }
}

impl<S> Drop for NavigationController<S> {
    fn drop(&mut self) {
        let tokens = std::mem::take(&mut *lock(&self.tokens));
        for token in tokens {
            self.bus.unsubscribe(token);
        }
    }
}

impl NavigationController<NavigationTree> {
    /// Displayed nodes in order.
    pub fn nodes(&self) -> Vec<TreeNode> {
        self.with_surface(|tree| tree.nodes().to_vec())
    }

    pub fn label(&self, key: &str) -> Option<String> {
        self.with_surface(|tree| tree.label(key).map(str::to_string))
    }

    pub fn active_dock(&self) -> Option<String> {
        self.with_surface(|tree| tree.active_dock().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::affinity_channel;
    use crate::model::{ActionId, ActionView, ThoughtId, ThoughtView};
    use std::sync::RwLock;

    /// Perspective stub whose contents tests set directly.
    #[derive(Default)]
    struct FakeView {
        inbox: RwLock<usize>,
        projects: RwLock<Vec<ProjectView>>,
        filter: RwLock<ActionFilter>,
    }

    impl FakeView {
        fn set_inbox(&self, n: usize) {
            *self.inbox.write().unwrap() = n;
        }

        fn add_project(&self, outcome: &str, done: &[bool]) -> ProjectId {
            let id = ProjectId::new();
            self.projects.write().unwrap().push(ProjectView {
                id,
                outcome: outcome.into(),
                actions: done
                    .iter()
                    .map(|&completed| ActionView {
                        id: ActionId::new(),
                        outcome: "step".into(),
                        completed,
                    })
                    .collect(),
            });
            id
        }
    }

    impl Perspective for FakeView {
        fn list_inbox(&self) -> Vec<ThoughtView> {
            (0..*self.inbox.read().unwrap())
                .map(|i| ThoughtView {
                    id: ThoughtId::new(),
                    subject: format!("t{i}"),
                })
                .collect()
        }

        fn list_projects(&self) -> Vec<ProjectView> {
            self.projects.read().unwrap().clone()
        }

        fn get_project(&self, id: ProjectId) -> Option<ProjectView> {
            self.projects.read().unwrap().iter().find(|p| p.id == id).cloned()
        }

        fn current_filter(&self) -> ActionFilter {
            *self.filter.read().unwrap()
        }
    }

    fn setup() -> (
        Arc<EventBus>,
        Arc<FakeView>,
        Arc<NavigationController<NavigationTree>>,
    ) {
        let bus = Arc::new(EventBus::new());
        let view = Arc::new(FakeView::default());
        let (dispatcher, _owner) = affinity_channel(None);
        let controller = NavigationController::wire(
            bus.clone(),
            dispatcher,
            view.clone(),
            NavigationTree::new(),
            NavigationConfig::default(),
        )
        .unwrap();
        (bus, view, controller)
    }

    #[test]
    fn project_label_variants() {
        assert_eq!(project_label("Buy milk", Some("2")), "Buy milk (2)");
        assert_eq!(project_label("Buy milk", Some("")), "Buy milk");
        assert_eq!(project_label("Buy milk", None), "Buy milk");
    }

    #[test]
    fn app_init_registers_dock_only() {
        let (bus, _view, nav) = setup();
        bus.publish(Message::AppInit).unwrap();
        assert_eq!(nav.active_dock().as_deref(), Some("nav-tree"));
        assert!(nav.nodes().is_empty());
        assert_eq!(nav.phase(), Phase::Unloaded);
    }

    #[test]
    fn events_ignored_until_loaded() {
        let (bus, view, nav) = setup();
        let p = view.add_project("Hidden", &[false]);
        bus.publish(Message::ThoughtCaptured {
            thought_id: ThoughtId::new(),
            subject: "x".into(),
        })
        .unwrap();
        bus.publish(Message::ProjectDefined {
            project_id: p,
            outcome: "Hidden".into(),
        })
        .unwrap();
        bus.publish(Message::FilterChanged {
            filter: ActionFilter::All,
        })
        .unwrap();
        bus.publish(Message::ActionAdded {
            project_id: ProjectId::new(),
            action_id: ActionId::new(),
            outcome: "ghost".into(),
        })
        .unwrap();

        assert!(nav.nodes().is_empty());
        assert!(nav.node_keys().is_empty());
    }

    #[test]
    fn form_loaded_rebuilds_tree() {
        let (bus, view, nav) = setup();
        view.set_inbox(3);
        let p1 = view.add_project("Buy milk", &[false, false]);
        let p2 = view.add_project("Write paper", &[]);

        bus.publish(Message::FormLoaded).unwrap();

        assert_eq!(nav.phase(), Phase::Loaded);
        let labels: Vec<_> = nav.nodes().into_iter().map(|n| n.label).collect();
        assert_eq!(labels, vec!["Inbox (3)", "Buy milk (2)", "Write paper (0)"]);
        assert_eq!(nav.node_keys().len(), 3);
        assert_eq!(nav.node_target(INBOX_KEY), Some(NodeTarget::Inbox));
        assert_eq!(
            nav.node_target(&crate::model::project_key(p1)),
            Some(NodeTarget::Project(p1))
        );
        assert_eq!(
            nav.node_target(&crate::model::project_key(p2)),
            Some(NodeTarget::Project(p2))
        );
    }

    #[test]
    fn thought_events_touch_only_inbox() {
        let (bus, view, nav) = setup();
        view.set_inbox(1);
        view.add_project("A", &[false]);
        bus.publish(Message::ClientModelLoaded).unwrap();
        let before = nav.nodes();

        view.set_inbox(2);
        bus.publish(Message::ThoughtCaptured {
            thought_id: ThoughtId::new(),
            subject: "new".into(),
        })
        .unwrap();

        let after = nav.nodes();
        assert_eq!(after[0].label, "Inbox (2)");
        assert_eq!(before[1..], after[1..]);
    }

    #[test]
    fn project_defined_is_idempotent() {
        let (bus, _view, nav) = setup();
        bus.publish(Message::FormLoaded).unwrap();
        let id = ProjectId::new();

        for outcome in ["Outcome", "Outcome v2"] {
            bus.publish(Message::ProjectDefined {
                project_id: id,
                outcome: outcome.into(),
            })
            .unwrap();
        }

        let key = crate::model::project_key(id);
        let matching: Vec<_> = nav.nodes().into_iter().filter(|n| n.key == key).collect();
        assert_eq!(matching.len(), 1);
        // Unknown to the perspective: no count.
        assert_eq!(matching[0].label, "Outcome v2");
    }

    #[test]
    fn project_defined_shows_count_when_known() {
        let (bus, view, nav) = setup();
        bus.publish(Message::FormLoaded).unwrap();
        let id = view.add_project("Known", &[]);
        bus.publish(Message::ProjectDefined {
            project_id: id,
            outcome: "Known".into(),
        })
        .unwrap();
        assert_eq!(
            nav.label(&crate::model::project_key(id)).as_deref(),
            Some("Known (0)")
        );
    }

    #[test]
    fn action_events_relabel_owning_project() {
        let (bus, view, nav) = setup();
        let id = view.add_project("Garden", &[false]);
        bus.publish(Message::FormLoaded).unwrap();
        let count_before = nav.nodes().len();

        view.projects.write().unwrap()[0].actions.push(ActionView {
            id: ActionId::new(),
            outcome: "water".into(),
            completed: false,
        });
        bus.publish(Message::ActionAdded {
            project_id: id,
            action_id: ActionId::new(),
            outcome: "water".into(),
        })
        .unwrap();

        assert_eq!(nav.nodes().len(), count_before);
        assert_eq!(
            nav.label(&crate::model::project_key(id)).as_deref(),
            Some("Garden (2)")
        );
    }

    #[test]
    fn action_for_unknown_project_surfaces_error() {
        let (bus, _view, _nav) = setup();
        bus.publish(Message::FormLoaded).unwrap();
        let err = bus
            .publish(Message::ActionUpdated {
                project_id: ProjectId::new(),
                action_id: ActionId::new(),
            })
            .unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert!(err.to_string().contains("project not visible"));
    }

    #[test]
    fn filter_change_relabels_every_project() {
        let (bus, view, nav) = setup();
        let p1 = view.add_project("P1", &[false, true]);
        let p2 = view.add_project("P2", &[true]);
        *view.filter.write().unwrap() = ActionFilter::All;
        bus.publish(Message::FormLoaded).unwrap();
        assert_eq!(nav.label(&crate::model::project_key(p1)).as_deref(), Some("P1 (2)"));
        assert_eq!(nav.label(&crate::model::project_key(p2)).as_deref(), Some("P2 (1)"));

        *view.filter.write().unwrap() = ActionFilter::Remaining;
        bus.publish(Message::FilterChanged {
            filter: ActionFilter::Remaining,
        })
        .unwrap();

        assert_eq!(nav.label(&crate::model::project_key(p1)).as_deref(), Some("P1 (1)"));
        assert_eq!(nav.label(&crate::model::project_key(p2)).as_deref(), Some("P2 (0)"));
    }

    #[test]
    fn selecting_nodes_publishes_intents() {
        let (bus, view, nav) = setup();
        let id = view.add_project("Trip", &[]);
        bus.publish(Message::FormLoaded).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [MessageKind::DisplayInbox, MessageKind::DisplayProject] {
            let seen = seen.clone();
            bus.subscribe_fn(kind, move |m| {
                seen.lock().unwrap().push(m.clone());
                Ok(())
            })
            .unwrap();
        }

        nav.when_node_selected(INBOX_KEY).unwrap();
        nav.when_node_selected(&crate::model::project_key(id)).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Message::DisplayInbox,
                Message::DisplayProject { project_id: id }
            ]
        );
    }

    #[test]
    fn unknown_key_fails_without_publishing() {
        let (bus, _view, nav) = setup();
        bus.publish(Message::FormLoaded).unwrap();
        let published = Arc::new(Mutex::new(0usize));
        for kind in [MessageKind::DisplayInbox, MessageKind::DisplayProject] {
            let published = published.clone();
            bus.subscribe_fn(kind, move |_| {
                *published.lock().unwrap() += 1;
                Ok(())
            })
            .unwrap();
        }

        let err = nav.when_node_selected("does-not-exist").unwrap_err();
        assert!(matches!(err, NavError::UnknownNodeKey(ref k) if k == "does-not-exist"));
        assert_eq!(*published.lock().unwrap(), 0);
    }

    #[test]
    fn inbox_selectable_before_load() {
        let (bus, _view, nav) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        bus.subscribe_fn(MessageKind::DisplayInbox, move |m| {
            s.lock().unwrap().push(m.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(nav.phase(), Phase::Unloaded);
        nav.when_node_selected(INBOX_KEY).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Message::DisplayInbox]);
    }

    #[test]
    fn load_navigation_tracks_later_changes() {
        let (bus, view, nav) = setup();
        view.set_inbox(1);
        nav.load_navigation().unwrap();
        assert_eq!(nav.phase(), Phase::Loaded);
        assert_eq!(nav.label(INBOX_KEY).as_deref(), Some("Inbox (1)"));

        view.set_inbox(2);
        bus.publish(Message::ThoughtCaptured {
            thought_id: ThoughtId::new(),
            subject: "later".into(),
        })
        .unwrap();
        assert_eq!(nav.label(INBOX_KEY).as_deref(), Some("Inbox (2)"));
    }

    #[test]
    fn dropping_controller_unsubscribes() {
        let (bus, _view, nav) = setup();
        assert_eq!(bus.subscriber_count(MessageKind::FormLoaded), 1);
        drop(nav);
        assert_eq!(bus.subscriber_count(MessageKind::FormLoaded), 0);
        assert!(bus.publish(Message::FormLoaded).is_ok());
    }
}

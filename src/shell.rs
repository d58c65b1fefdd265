//! Shell — wires bus, model, dispatcher and navigation controller.
//!
//! Must be started on the thread that will own the display surface: the
//! affinity channel binds to the calling thread.

use std::sync::Arc;

use tracing::info;

use crate::bus::{EventBus, Message};
use crate::config::NavConfig;
use crate::dispatch::{affinity_channel, AffinityDispatcher, OwnerLoop};
use crate::model::ClientModel;
use crate::nav::{NavResult, NavigationController, NavigationTree};

pub struct Shell {
    pub bus: Arc<EventBus>,
    pub model: Arc<ClientModel>,
    pub nav: Arc<NavigationController<NavigationTree>>,
    pub dispatcher: AffinityDispatcher,
    pub owner: OwnerLoop,
}

impl Shell {
    /// Build every component and announce `AppInit`.
    pub fn start(config: &NavConfig) -> NavResult<Self> {
        let bus = Arc::new(EventBus::with_policy(config.bus.delivery));
        let model = Arc::new(ClientModel::with_filter(bus.clone(), config.filter));
        let (dispatcher, owner) = affinity_channel(config.dispatch_timeout());

        let nav = NavigationController::wire(
            bus.clone(),
            dispatcher.clone(),
            model.clone(),
            NavigationTree::new(),
            config.navigation.clone(),
        )?;

        bus.publish(Message::AppInit)?;
        info!(
            delivery = ?bus.policy(),
            filter = %config.filter,
            "shell started"
        );

        Ok(Self {
            bus,
            model,
            nav,
            dispatcher,
            owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::DeliveryPolicy;
    use crate::nav::Phase;

    #[test]
    fn start_registers_dock() {
        let shell = Shell::start(&NavConfig::default()).unwrap();
        assert_eq!(shell.nav.active_dock().as_deref(), Some("nav-tree"));
        assert_eq!(shell.nav.phase(), Phase::Unloaded);
    }

    #[test]
    fn bus_uses_configured_policy() {
        let mut config = NavConfig::default();
        config.bus.delivery = DeliveryPolicy::FailFast;
        let shell = Shell::start(&config).unwrap();
        assert_eq!(shell.bus.policy(), DeliveryPolicy::FailFast);
    }

    #[test]
    fn model_load_builds_inbox_node() {
        let mut config = NavConfig::default();
        config.navigation.inbox_label = "In".into();
        let shell = Shell::start(&config).unwrap();

        shell.model.capture_thought("before load").unwrap();
        assert!(shell.nav.nodes().is_empty());

        shell.model.load().unwrap();
        assert_eq!(shell.nav.label("inbox").as_deref(), Some("In (1)"));
    }
}

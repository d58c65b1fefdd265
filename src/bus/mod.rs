//! Event bus — synchronous, typed publish/subscribe.
//!
//! One explicitly constructed bus per process, shared as `Arc<EventBus>`.
//! `publish` snapshots the subscriber list for the message's kind and
//! invokes each handler in subscription order on the calling thread.
//! No lock is held while handlers run, so handlers may publish, subscribe
//! or unsubscribe freely.
//!
//! Subscriptions hold either a strong or a weak handler reference. A weak
//! reference that is already dead at subscribe time is rejected; one that
//! dies later is pruned on the next publish of its kind.

pub mod error;
pub mod message;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use error::{BusError, BusResult, HandlerFailure};
pub use message::{Message, MessageKind};

/// A message consumer.
pub trait Handler: Send + Sync {
    fn handle(&self, message: &Message) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&Message) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, message: &Message) -> anyhow::Result<()> {
        self(message)
    }
}

/// How the bus holds on to a handler.
#[derive(Clone)]
pub enum HandlerRef {
    /// Keeps the handler alive for the lifetime of the subscription.
    Strong(Arc<dyn Handler>),
    /// Delivers only while someone else keeps the handler alive.
    Weak(Weak<dyn Handler>),
}

impl HandlerRef {
    fn upgrade(&self) -> Option<Arc<dyn Handler>> {
        match self {
            Self::Strong(h) => Some(h.clone()),
            Self::Weak(h) => h.upgrade(),
        }
    }
}

impl<T: Handler + 'static> From<Arc<T>> for HandlerRef {
    fn from(handler: Arc<T>) -> Self {
        Self::Strong(handler)
    }
}

impl<T: Handler + 'static> From<Weak<T>> for HandlerRef {
    fn from(handler: Weak<T>) -> Self {
        Self::Weak(handler)
    }
}

impl From<Arc<dyn Handler>> for HandlerRef {
    fn from(handler: Arc<dyn Handler>) -> Self {
        Self::Strong(handler)
    }
}

/// Opaque handle for a single registration. Only used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// What `publish` does when a handler fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Keep delivering; report every failure once all handlers ran.
    #[default]
    Isolate,
    /// Stop at the first failure.
    FailFast,
}

#[derive(Clone)]
struct Subscription {
    token: SubscriptionToken,
    handler: HandlerRef,
}

type Registry = HashMap<MessageKind, Vec<Subscription>>;

pub struct EventBus {
    subscribers: RwLock<Registry>,
    next_token: AtomicU64,
    policy: DeliveryPolicy,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_policy(DeliveryPolicy::default())
    }

    pub fn with_policy(policy: DeliveryPolicy) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            policy,
        }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.subscribers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for `kind`. Takes effect from the next `publish`.
    pub fn subscribe(
        &self,
        kind: MessageKind,
        handler: impl Into<HandlerRef>,
    ) -> BusResult<SubscriptionToken> {
        let handler = handler.into();
        if handler.upgrade().is_none() {
            return Err(BusError::InvalidHandler { kind });
        }

        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.write()
            .entry(kind)
            .or_default()
            .push(Subscription { token, handler });
        debug!(%kind, %token, "subscribed");
        Ok(token)
    }

    /// Register a closure for `kind`. The bus keeps it alive.
    pub fn subscribe_fn<F>(&self, kind: MessageKind, handler: F) -> BusResult<SubscriptionToken>
    where
        F: Fn(&Message) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe(kind, Arc::new(handler))
    }

    /// Remove a registration. Returns false if it was already gone.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subs = self.write();
        for list in subs.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.token == token) {
                list.remove(pos);
                debug!(%token, "unsubscribed");
                return true;
            }
        }
        false
    }

    /// Deliver `message` to every handler registered for its kind.
    pub fn publish(&self, message: Message) -> BusResult<()> {
        let kind = message.kind();
        let snapshot: Vec<Subscription> = self.read().get(&kind).cloned().unwrap_or_default();
        debug!(%kind, subscribers = snapshot.len(), "publish");

        let mut failures = Vec::new();
        let mut dead = Vec::new();
        for sub in &snapshot {
            let Some(handler) = sub.handler.upgrade() else {
                dead.push(sub.token);
                continue;
            };
            if let Err(error) = handler.handle(&message) {
                warn!(%kind, token = %sub.token, "handler failed: {error:#}");
                failures.push(HandlerFailure {
                    token: sub.token,
                    error,
                });
                if self.policy == DeliveryPolicy::FailFast {
                    break;
                }
            }
        }

        if !dead.is_empty() {
            let mut subs = self.write();
            if let Some(list) = subs.get_mut(&kind) {
                list.retain(|s| !dead.contains(&s.token));
            }
            debug!(%kind, pruned = dead.len(), "pruned dead subscribers");
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::HandlerFailure { kind, failures })
        }
    }

    /// Current registrations for `kind` (debug aid).
    pub fn subscriber_count(&self, kind: MessageKind) -> usize {
        self.read().get(&kind).map(Vec::len).unwrap_or(0)
    }
}

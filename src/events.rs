//! Synchronous publish/subscribe hub connecting subsystems and external collaborators.
//!
//! Delivery happens on the caller's stack, in subscriber-registration order. A publish
//! issued from inside a handler completes before the outer dispatch resumes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::{Duration, Instant};

use circular_buffer::CircularBuffer;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::error::{panic_message, Phase, SystemError};

/// Topics published by the engine and the simulation.
pub mod topics {
    pub const SYSTEM_INITIALIZED: &str = "SYSTEM_INITIALIZED";
    pub const SYSTEM_ERROR: &str = "SYSTEM_ERROR";
    pub const SUBSYSTEM_REGISTERED: &str = "SUBSYSTEM_REGISTERED";
    pub const SUBSYSTEM_UNREGISTERED: &str = "SUBSYSTEM_UNREGISTERED";
    pub const SUBSYSTEM_FAILED: &str = "SUBSYSTEM_FAILED";
    pub const PERFORMANCE_WARNING: &str = "PERFORMANCE_WARNING";
    pub const MEMORY_THRESHOLD_EXCEEDED: &str = "MEMORY_THRESHOLD_EXCEEDED";

    pub const GAME_STARTED: &str = "GAME_STARTED";
    pub const GAME_PAUSED: &str = "GAME_PAUSED";
    pub const GAME_RESUMED: &str = "GAME_RESUMED";
    pub const GAME_OVER: &str = "GAME_OVER";
    pub const GAME_RESET: &str = "GAME_RESET";
    pub const QUIT_REQUESTED: &str = "QUIT_REQUESTED";

    pub const PLAYER_DIED: &str = "PLAYER_DIED";
    pub const PLAYER_DAMAGED: &str = "PLAYER_DAMAGED";
    pub const PLAYER_JUMPED: &str = "PLAYER_JUMPED";
    pub const PLAYER_DUCKED: &str = "PLAYER_DUCKED";
    pub const SHIELD_CHANGED: &str = "SHIELD_CHANGED";
    pub const SHIELD_BLOCKED: &str = "SHIELD_BLOCKED";
    pub const SCORE_UPDATED: &str = "SCORE_UPDATED";
    pub const LEVEL_UP: &str = "LEVEL_UP";
    pub const NEW_BEST_SCORE: &str = "NEW_BEST_SCORE";

    pub const WIZARD_WARNING: &str = "WIZARD_WARNING";
    pub const NINJA_PHASE_CHANGED: &str = "NINJA_PHASE_CHANGED";
    pub const PROJECTILE_FIRED: &str = "PROJECTILE_FIRED";
}

/// Source name used for events published outside of any subsystem.
pub const ENGINE_SOURCE: &str = "engine";

/// Number of handler faults retained for inspection.
const FAULT_HISTORY: usize = 64;

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:.3}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Opaque key/value mapping attached to an event. Most events carry a handful of fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(SmallVec<[(&'static str, Value); 4]>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated key replaces the earlier value.
    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_float)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

/// Informational urgency of an event. Delivery order never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Immutable record handed to every subscriber of a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub topic: String,
    /// Time since the bus was created.
    pub timestamp: Duration,
    /// Name of the subsystem that published the event.
    pub source: String,
    pub payload: Payload,
    pub priority: Priority,
}

impl Event {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// Handle returned by [`EventBus::subscribe`], used to remove the subscription later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = dyn FnMut(&Event) -> anyhow::Result<()>;

struct Subscriber {
    id: SubscriptionId,
    topic: String,
    owner: String,
    handler: Rc<RefCell<Box<Handler>>>,
}

struct BusInner {
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
    epoch: Instant,
    published: Cell<u64>,
    fault_count: Cell<u64>,
    faults: RefCell<CircularBuffer<FAULT_HISTORY, SystemError>>,
}

/// Cloneable handle to a single-threaded event bus.
///
/// Every clone refers to the same subscriber lists, so handlers may capture a clone
/// and publish, subscribe or unsubscribe while a dispatch is in progress.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .field("published", &self.inner.published.get())
            .field("faults", &self.inner.fault_count.get())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BusInner {
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                epoch: Instant::now(),
                published: Cell::new(0),
                fault_count: Cell::new(0),
                faults: RefCell::new(CircularBuffer::new()),
            }),
        }
    }

    /// Registers `handler` for `topic`. `owner` tags any fault raised by the handler.
    pub fn subscribe<F>(&self, topic: &str, owner: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        self.inner.subscribers.borrow_mut().push(Subscriber {
            id,
            topic: topic.to_string(),
            owner: owner.to_string(),
            handler: Rc::new(RefCell::new(Box::new(handler))),
        });
        trace!(topic, owner, id = id.0, "Subscribed");
        id
    }

    /// Removes a subscription. Returns `false` if the handle was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if removed {
            trace!(id = id.0, "Unsubscribed");
        }
        removed
    }

    /// Removes every subscription registered under `owner`.
    pub fn unsubscribe_owner(&self, owner: &str) -> usize {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.owner != owner);
        before - subscribers.len()
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.borrow().iter().any(|s| s.id == id)
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.subscribers.borrow().iter().filter(|s| s.topic == topic).count()
    }

    /// Publishes on behalf of the engine itself.
    pub fn publish(&self, topic: &str, payload: Payload) -> usize {
        self.publish_from(ENGINE_SOURCE, topic, payload)
    }

    pub fn publish_from(&self, source: &str, topic: &str, payload: Payload) -> usize {
        self.emit(Event {
            topic: topic.to_string(),
            timestamp: self.inner.epoch.elapsed(),
            source: source.to_string(),
            payload,
            priority: Priority::Normal,
        })
    }

    /// Delivers `event` to every current subscriber of its topic and returns how many
    /// handlers completed without error.
    ///
    /// Subscribers added during the dispatch do not see this event; subscribers removed
    /// during the dispatch are not called. A handler that is still running further up the
    /// stack is skipped instead of being re-entered.
    pub fn emit(&self, event: Event) -> usize {
        self.inner.published.set(self.inner.published.get() + 1);

        let targets: SmallVec<[(SubscriptionId, String, Rc<RefCell<Box<Handler>>>); 8]> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic == event.topic)
            .map(|s| (s.id, s.owner.clone(), Rc::clone(&s.handler)))
            .collect();

        trace!(topic = %event.topic, source = %event.source, subscribers = targets.len(), "Dispatching event");

        let mut delivered = 0;
        for (id, owner, handler) in targets {
            if !self.is_subscribed(id) {
                continue;
            }

            let Ok(mut handler) = handler.try_borrow_mut() else {
                debug!(topic = %event.topic, owner = %owner, "Handler is already running, skipping re-entrant delivery");
                continue;
            };
            let callback: &mut Handler = &mut **handler;

            let failure = match panic::catch_unwind(AssertUnwindSafe(|| callback(&event))) {
                Ok(Ok(())) => {
                    delivered += 1;
                    None
                }
                Ok(Err(error)) => Some(format!("{error:#}")),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };

            if let Some(message) = failure {
                let error = SystemError::new(owner, Phase::EventHandler, message);
                warn!(topic = %event.topic, %error, "Event handler failed");
                self.record_fault(error);
            }
        }

        delivered
    }

    /// Total number of events published since creation.
    pub fn published_count(&self) -> u64 {
        self.inner.published.get()
    }

    /// Total number of handler faults since creation.
    pub fn fault_count(&self) -> u64 {
        self.inner.fault_count.get()
    }

    /// Takes the most recent handler faults, oldest first.
    pub fn drain_faults(&self) -> Vec<SystemError> {
        self.inner.faults.borrow_mut().drain(..).collect()
    }

    fn record_fault(&self, error: SystemError) {
        self.inner.fault_count.set(self.inner.fault_count.get() + 1);
        self.inner.faults.borrow_mut().push_back(error);
    }
}

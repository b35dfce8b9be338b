//! Event manager - registration and dispatch
//!
//! Keeps a map of event name to handler list. Handlers are registered once
//! at startup from an explicit subscription table and invoked synchronously
//! on the simulation thread when the host fires the event into the plugin.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use super::payload::EventPayload;

new_key_type! {
    /// Key for a registered event handler, used for removal
    pub struct EventKey;
}

/// Type alias for event callback functions
pub type EventCallback = Box<dyn Fn(&EventPayload) + Send + Sync>;

/// Global event manager
static EVENTS: LazyLock<RwLock<EventManager>> = LazyLock::new(|| RwLock::new(EventManager::new()));

/// Event manager for registering and dispatching event handlers
struct EventManager {
    /// Map of event name to handler keys, in registration order
    hooks: HashMap<String, Vec<EventKey>>,
    /// Handler storage
    handlers: SlotMap<EventKey, EventCallback>,
    /// Reverse map for removal
    names: HashMap<EventKey, String>,
}

impl EventManager {
    fn new() -> Self {
        Self {
            hooks: HashMap::new(),
            handlers: SlotMap::with_key(),
            names: HashMap::new(),
        }
    }
}

/// Register a handler for a named event
///
/// # Arguments
/// * `name` - Event name (e.g., "player_spawn", "round_start")
/// * `callback` - Function to call when the event fires
pub fn register_event<F>(name: &str, callback: F) -> EventKey
where
    F: Fn(&EventPayload) + Send + Sync + 'static,
{
    let mut manager = EVENTS.write();
    let key = manager.handlers.insert(Box::new(callback));
    manager
        .hooks
        .entry(name.to_string())
        .or_default()
        .push(key);
    manager.names.insert(key, name.to_string());

    tracing::debug!("Registered handler for event '{}'", name);
    key
}

/// Unregister a handler by key
///
/// Returns `true` if the handler was found and removed.
pub fn unregister_event(key: EventKey) -> bool {
    let mut manager = EVENTS.write();
    if manager.handlers.remove(key).is_none() {
        return false;
    }
    if let Some(name) = manager.names.remove(&key) {
        if let Some(keys) = manager.hooks.get_mut(&name) {
            keys.retain(|k| *k != key);
        }
        tracing::debug!("Unregistered handler for event '{}'", name);
    }
    true
}

/// Fire a named event, invoking every registered handler in order.
///
/// Handlers run synchronously on the calling thread while the manager lock
/// is held for reading; they must not register or unregister handlers.
pub fn fire_event(name: &str, payload: &EventPayload) {
    let manager = EVENTS.read();
    let Some(keys) = manager.hooks.get(name) else {
        return;
    };

    tracing::trace!("Firing event '{}' to {} handler(s)", name, keys.len());
    for key in keys {
        if let Some(handler) = manager.handlers.get(*key) {
            handler(payload);
        }
    }
}

/// Number of handlers registered for an event
pub fn handler_count(name: &str) -> usize {
    EVENTS
        .read()
        .hooks
        .get(name)
        .map(|keys| keys.len())
        .unwrap_or(0)
}

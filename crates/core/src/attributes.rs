//! Attribute post-hooks
//!
//! Callback registry fired after a player attribute changes through the
//! player registry. Follows the same pattern as the event handler tables:
//! callbacks live in a slotmap behind a `RwLock`, keyed for removal.

use std::sync::LazyLock;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::players::UserId;

/// Attribute name for multi-kill progress
pub const MULTI_KILL: &str = "multi_kill";

new_key_type! {
    /// Key for a registered attribute hook, used for removal
    pub struct AttributeHookKey;
}

/// Callback signature: (player, old value, new value)
pub type AttributeCallback = Box<dyn Fn(UserId, i32, i32) + Send + Sync>;

struct AttributeHook {
    attribute: String,
    callback: AttributeCallback,
}

static ATTRIBUTE_HOOKS: LazyLock<RwLock<SlotMap<AttributeHookKey, AttributeHook>>> =
    LazyLock::new(|| RwLock::new(SlotMap::with_key()));

/// Register a post-hook for a named player attribute
pub fn register_attribute_hook<F>(attribute: &str, callback: F) -> AttributeHookKey
where
    F: Fn(UserId, i32, i32) + Send + Sync + 'static,
{
    let key = ATTRIBUTE_HOOKS.write().insert(AttributeHook {
        attribute: attribute.to_string(),
        callback: Box::new(callback),
    });
    tracing::debug!("Registered attribute hook for '{}'", attribute);
    key
}

/// Remove an attribute hook by key
///
/// Returns `true` if the hook was found and removed.
pub fn remove_attribute_hook(key: AttributeHookKey) -> bool {
    ATTRIBUTE_HOOKS.write().remove(key).is_some()
}

/// Fire all hooks registered for `attribute`.
///
/// Called by the player registry after the value has been written and the
/// registry lock released, so callbacks are free to read and write records.
pub(crate) fn fire_attribute_hooks(attribute: &str, user: UserId, old: i32, new: i32) {
    let hooks = ATTRIBUTE_HOOKS.read();
    for hook in hooks.values() {
        if hook.attribute == attribute {
            (hook.callback)(user, old, new);
        }
    }
}

/// Remove every registered attribute hook
pub fn clear_attribute_hooks() {
    ATTRIBUTE_HOOKS.write().clear();
}

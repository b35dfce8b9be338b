//! Player record registry
//!
//! Process-wide storage mapping a stable user id to the mutable scoreboard
//! record for that player. Records are created by the host when a player
//! joins; this core only reads and writes individual fields.
//!
//! Updating `multi_kill` through [`set_multi_kill`] fires the registered
//! attribute post-hooks, mirroring how the host notifies attribute changes.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::attributes;

/// Stable per-player identifier, as carried in event payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i32);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable scoreboard-facing state for one player
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Current GunGame level; `None` until the first level is assigned
    pub level: Option<i32>,
    /// Engine-visible kill counter (the field the scoreboard renders)
    pub kills: i32,
    /// Engine-visible death counter
    pub deaths: i32,
    /// Kills toward the next level
    pub multi_kill: i32,
    /// Multi-kill threshold for the current level
    pub level_multi_kill: i32,
    /// Team identifier
    pub team: i32,
}

/// Global player registry, keyed by user id
static PLAYERS: LazyLock<RwLock<HashMap<UserId, PlayerRecord>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Entity-instance address -> user id, populated as players spawn.
///
/// The native counter functions receive an instance pointer, not a user id;
/// this map is how the detours recover the owning player.
static ENTITY_OWNERS: LazyLock<RwLock<HashMap<usize, UserId>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Insert or replace a player record
pub fn insert_player(user: UserId, record: PlayerRecord) {
    PLAYERS.write().insert(user, record);
}

/// Remove a player record, returning it if present
pub fn remove_player(user: UserId) -> Option<PlayerRecord> {
    PLAYERS.write().remove(&user)
}

/// Read a player's record through a closure; `None` if the player is unknown
pub fn with_player<R>(user: UserId, f: impl FnOnce(&PlayerRecord) -> R) -> Option<R> {
    PLAYERS.read().get(&user).map(f)
}

/// Mutate a player's record through a closure; `None` if the player is unknown
pub fn update_player<R>(user: UserId, f: impl FnOnce(&mut PlayerRecord) -> R) -> Option<R> {
    PLAYERS.write().get_mut(&user).map(f)
}

/// Snapshot a player's record
pub fn player(user: UserId) -> Option<PlayerRecord> {
    PLAYERS.read().get(&user).cloned()
}

/// Set a player's multi-kill progress and fire attribute post-hooks.
///
/// The registry lock is released before hooks run, since hooks typically
/// read the record back and write the death field.
pub fn set_multi_kill(user: UserId, value: i32) {
    let old = {
        let mut players = PLAYERS.write();
        let Some(record) = players.get_mut(&user) else {
            return;
        };
        let old = record.multi_kill;
        record.multi_kill = value;
        old
    };

    if old != value {
        attributes::fire_attribute_hooks(attributes::MULTI_KILL, user, old, value);
    }
}

/// Associate a native entity instance with its owning player
pub fn bind_entity(instance: usize, user: UserId) {
    ENTITY_OWNERS.write().insert(instance, user);
}

/// Drop an entity-instance association
pub fn unbind_entity(instance: usize) {
    ENTITY_OWNERS.write().remove(&instance);
}

/// Look up the player owning a native entity instance
pub fn user_from_entity(instance: usize) -> Option<UserId> {
    ENTITY_OWNERS.read().get(&instance).copied()
}

/// Clear all player records and entity bindings (match teardown)
pub fn clear_players() {
    PLAYERS.write().clear();
    ENTITY_OWNERS.write().clear();
}

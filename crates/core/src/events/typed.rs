//! Typed game event structures
//!
//! Strongly-typed wrappers around the event payloads this plugin consumes.

use super::manager::{register_event, EventKey};
use super::payload::EventPayload;

/// Trait for typed game events
pub trait GameEvent: Sized {
    /// The event name (e.g., "player_spawn")
    const NAME: &'static str;

    /// Create from a raw payload
    fn from_payload(payload: &EventPayload) -> Self;
}

/// Round start event
#[derive(Debug, Clone)]
pub struct EventRoundStart {
    /// Time limit for the round
    pub timelimit: i32,
}

impl GameEvent for EventRoundStart {
    const NAME: &'static str = "round_start";

    fn from_payload(payload: &EventPayload) -> Self {
        Self {
            timelimit: payload.get_int("timelimit", 0),
        }
    }
}

/// Round end event
#[derive(Debug, Clone)]
pub struct EventRoundEnd {
    /// Winning team
    pub winner: i32,
}

impl GameEvent for EventRoundEnd {
    const NAME: &'static str = "round_end";

    fn from_payload(payload: &EventPayload) -> Self {
        Self {
            winner: payload.get_int("winner", 0),
        }
    }
}

/// Player spawn event
#[derive(Debug, Clone)]
pub struct EventPlayerSpawn {
    /// User ID of the player who spawned
    pub userid: i32,
}

impl GameEvent for EventPlayerSpawn {
    const NAME: &'static str = "player_spawn";

    fn from_payload(payload: &EventPayload) -> Self {
        Self {
            userid: payload.get_int("userid", -1),
        }
    }
}

/// GunGame level-up event
#[derive(Debug, Clone)]
pub struct EventLevelUp {
    /// User ID of the player who leveled
    pub leveler: i32,
    /// Level before the change
    pub old_level: i32,
    /// Level after the change
    pub new_level: i32,
}

impl GameEvent for EventLevelUp {
    const NAME: &'static str = "gg_level_up";

    fn from_payload(payload: &EventPayload) -> Self {
        Self {
            leveler: payload.get_int("leveler", -1),
            old_level: payload.get_int("old_level", 0),
            new_level: payload.get_int("new_level", 0),
        }
    }
}

/// GunGame level-down event
#[derive(Debug, Clone)]
pub struct EventLevelDown {
    /// User ID of the player who leveled
    pub leveler: i32,
    /// Level before the change
    pub old_level: i32,
    /// Level after the change
    pub new_level: i32,
}

impl GameEvent for EventLevelDown {
    const NAME: &'static str = "gg_level_down";

    fn from_payload(payload: &EventPayload) -> Self {
        Self {
            leveler: payload.get_int("leveler", -1),
            old_level: payload.get_int("old_level", 0),
            new_level: payload.get_int("new_level", 0),
        }
    }
}

/// GunGame team level-up event
#[derive(Debug, Clone)]
pub struct EventTeamLevelUp {
    /// Team that leveled
    pub team: i32,
    /// Level before the change
    pub old_level: i32,
    /// Level after the change
    pub new_level: i32,
}

impl GameEvent for EventTeamLevelUp {
    const NAME: &'static str = "gg_team_level_up";

    fn from_payload(payload: &EventPayload) -> Self {
        Self {
            team: payload.get_int("team", -1),
            old_level: payload.get_int("old_level", 0),
            new_level: payload.get_int("new_level", 0),
        }
    }
}

/// Helper function to register a typed event handler
pub fn register_typed_event<E, F>(callback: F) -> EventKey
where
    E: GameEvent,
    F: Fn(E) + Send + Sync + 'static,
{
    register_event(E::NAME, move |payload| {
        callback(E::from_payload(payload));
    })
}

//! Event subscription and dispatch fabric
//!
//! The host feeds named game and GunGame events into [`fire_event`]; the
//! reactor registers its handlers through [`register_event`] at startup.

pub mod manager;
pub mod payload;
pub mod typed;

pub use manager::{fire_event, handler_count, register_event, unregister_event, EventKey};
pub use payload::{EventPayload, EventValue};
pub use typed::{
    register_typed_event, EventLevelDown, EventLevelUp, EventPlayerSpawn, EventRoundEnd,
    EventRoundStart, EventTeamLevelUp, GameEvent,
};

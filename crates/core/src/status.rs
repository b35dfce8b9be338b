//! Match status and plugin registry
//!
//! Read-only collaborators from the core's perspective: the current match
//! phase, and which sibling plugins are loaded. The interceptor and reactor
//! consult these as guard clauses; team-play owns scoring when active.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::LazyLock;

use parking_lot::RwLock;

/// Name of the team-play plugin this core defers to
pub const TEAMPLAY_PLUGIN: &str = "gg_teamplay";

/// Current phase of a GunGame match
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// No match running
    Inactive = 0,
    /// Warmup round before the match proper
    Warmup = 1,
    /// Match in progress; the only phase where score substitution runs
    Active = 2,
    /// Between match end and map change
    PostRound = 3,
}

impl From<u8> for MatchStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Warmup,
            2 => Self::Active,
            3 => Self::PostRound,
            _ => Self::Inactive,
        }
    }
}

static MATCH_STATUS: AtomicU8 = AtomicU8::new(MatchStatus::Inactive as u8);

static LOADED_PLUGINS: LazyLock<RwLock<HashSet<String>>> =
    LazyLock::new(|| RwLock::new(HashSet::new()));

static TEAM_GAME: AtomicBool = AtomicBool::new(false);

/// Get the current match phase
pub fn match_status() -> MatchStatus {
    MatchStatus::from(MATCH_STATUS.load(Ordering::Acquire))
}

/// Set the current match phase
pub fn set_match_status(status: MatchStatus) {
    let old = MATCH_STATUS.swap(status as u8, Ordering::AcqRel);
    if old != status as u8 {
        tracing::debug!("Match status: {:?} -> {:?}", MatchStatus::from(old), status);
    }
}

/// Check whether a sibling plugin is currently loaded
pub fn plugin_loaded(name: &str) -> bool {
    LOADED_PLUGINS.read().contains(name)
}

/// Mark a sibling plugin as loaded or unloaded
pub fn set_plugin_loaded(name: &str, loaded: bool) {
    let mut plugins = LOADED_PLUGINS.write();
    if loaded {
        plugins.insert(name.to_string());
    } else {
        plugins.remove(name);
    }
}

/// Whether the current match is team-based
pub fn is_team_game() -> bool {
    TEAM_GAME.load(Ordering::Acquire)
}

/// Set the team-game flag
pub fn set_team_game(team_game: bool) {
    TEAM_GAME.store(team_game, Ordering::Release);
}

/// Reset all status state (match teardown and tests)
pub fn reset_status() {
    MATCH_STATUS.store(MatchStatus::Inactive as u8, Ordering::Release);
    LOADED_PLUGINS.write().clear();
    TEAM_GAME.store(false, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_u8() {
        assert_eq!(MatchStatus::from(0), MatchStatus::Inactive);
        assert_eq!(MatchStatus::from(1), MatchStatus::Warmup);
        assert_eq!(MatchStatus::from(2), MatchStatus::Active);
        assert_eq!(MatchStatus::from(3), MatchStatus::PostRound);
        // Unknown values map to Inactive
        assert_eq!(MatchStatus::from(200), MatchStatus::Inactive);
    }

    #[test]
    fn test_plugin_membership() {
        set_plugin_loaded("test_plugin_x", true);
        assert!(plugin_loaded("test_plugin_x"));
        set_plugin_loaded("test_plugin_x", false);
        assert!(!plugin_loaded("test_plugin_x"));
    }
}

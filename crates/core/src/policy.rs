//! Score substitution policy
//!
//! Pure computations deciding what value the scoreboard should show in
//! place of the native kill/death counters. The kill field tracks the
//! player's level; the death field optionally tracks multi-kill progress,
//! depending on the configured [`MultiKillMode`].

use crate::players::PlayerRecord;

/// How the death counter is repurposed on the scoreboard
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiKillMode {
    /// Death counter is left alone
    Disabled = 0,
    /// Death counter shows the current multi-kill progress
    Absolute = 1,
    /// Death counter shows kills remaining until the next level
    Remaining = 2,
}

impl From<i32> for MultiKillMode {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Absolute,
            2 => Self::Remaining,
            // Any other value, including out-of-range config input, disables
            // the substitution rather than erroring.
            _ => Self::Disabled,
        }
    }
}

impl Default for MultiKillMode {
    fn default() -> Self {
        Self::Disabled
    }
}

/// Compute the value to write into the player's death counter.
///
/// Returns `None` ("no override") when the player has no level yet or the
/// mode is [`MultiKillMode::Disabled`].
///
/// In `Remaining` mode the result is `level_multi_kill - multi_kill` with no
/// clamping, so it can go negative if progress overshoots the threshold.
pub fn death_substitute(player: &PlayerRecord, mode: MultiKillMode) -> Option<i32> {
    match player.level {
        None | Some(0) => return None,
        Some(_) => {}
    }

    match mode {
        MultiKillMode::Disabled => None,
        MultiKillMode::Absolute => Some(player.multi_kill),
        MultiKillMode::Remaining => Some(player.level_multi_kill - player.multi_kill),
    }
}

/// Compute the value to write into the player's kill counter.
///
/// The kill counter simply mirrors the player's level; `None` when no level
/// has been assigned yet.
pub fn kill_substitute(player: &PlayerRecord) -> Option<i32> {
    match player.level {
        None | Some(0) => None,
        Some(level) => Some(level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leveled(level: i32, multi_kill: i32, level_multi_kill: i32) -> PlayerRecord {
        PlayerRecord {
            level: Some(level),
            multi_kill,
            level_multi_kill,
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_from_int() {
        assert_eq!(MultiKillMode::from(0), MultiKillMode::Disabled);
        assert_eq!(MultiKillMode::from(1), MultiKillMode::Absolute);
        assert_eq!(MultiKillMode::from(2), MultiKillMode::Remaining);
        // Out-of-range values degrade to Disabled, never an error
        assert_eq!(MultiKillMode::from(-1), MultiKillMode::Disabled);
        assert_eq!(MultiKillMode::from(3), MultiKillMode::Disabled);
        assert_eq!(MultiKillMode::from(100), MultiKillMode::Disabled);
    }

    #[test]
    fn test_no_level_means_no_override() {
        let unleveled = PlayerRecord::default();
        assert_eq!(death_substitute(&unleveled, MultiKillMode::Absolute), None);
        assert_eq!(death_substitute(&unleveled, MultiKillMode::Remaining), None);
        assert_eq!(kill_substitute(&unleveled), None);

        let zero = leveled(0, 5, 10);
        assert_eq!(death_substitute(&zero, MultiKillMode::Absolute), None);
        assert_eq!(death_substitute(&zero, MultiKillMode::Remaining), None);
        assert_eq!(kill_substitute(&zero), None);
    }

    #[test]
    fn test_disabled_mode() {
        let player = leveled(5, 2, 10);
        assert_eq!(death_substitute(&player, MultiKillMode::Disabled), None);
    }

    #[test]
    fn test_absolute_mode() {
        for multi_kill in 0..8 {
            let player = leveled(3, multi_kill, 10);
            assert_eq!(
                death_substitute(&player, MultiKillMode::Absolute),
                Some(multi_kill)
            );
        }
    }

    #[test]
    fn test_remaining_mode() {
        let player = leveled(5, 2, 10);
        assert_eq!(death_substitute(&player, MultiKillMode::Remaining), Some(8));
    }

    #[test]
    fn test_remaining_mode_can_go_negative() {
        // Boundary case: progress past the threshold is not clamped
        let player = leveled(5, 12, 10);
        assert_eq!(
            death_substitute(&player, MultiKillMode::Remaining),
            Some(-2)
        );
    }

    #[test]
    fn test_kill_substitute_mirrors_level() {
        let player = leveled(7, 0, 10);
        assert_eq!(kill_substitute(&player), Some(7));
    }

    #[test]
    fn test_idempotent() {
        let player = leveled(4, 1, 6);
        let first = death_substitute(&player, MultiKillMode::Remaining);
        let second = death_substitute(&player, MultiKillMode::Remaining);
        assert_eq!(first, second);
    }
}

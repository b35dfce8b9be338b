//! Score interceptor
//!
//! The correlation and reentrancy state shared between the pre- and
//! post-legs of a hooked counter-increment call. One logical increment may
//! re-enter the hooked entry point on some platforms, so the pre-hook keeps
//! a per-function guard that swallows exactly one synthetic re-entry.
//!
//! Pre and post legs are matched through the call-site id, the address of a
//! stack local in the detour frame. Calls are not reentrant across unrelated
//! players on one thread, so the frame address is unique among concurrently
//! overlapping calls and identical between the two legs of the same call.
//!
//! All of this state lives in one owned instance and is reset at round
//! boundaries; a suppressed post-hook can therefore never leak a pending
//! entry across rounds.

use std::collections::HashMap;

use crate::config;
use crate::players::{self, UserId};
use crate::policy;
use crate::status::{self, MatchStatus, TEAMPLAY_PLUGIN};

/// The two hooked native counter functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterFn {
    FragCount,
    DeathCount,
}

impl CounterFn {
    fn index(self) -> usize {
        match self {
            Self::FragCount => 0,
            Self::DeathCount => 1,
        }
    }
}

/// How substituted values reach the engine-visible fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Override the increment delta in the pre-hook (older variant)
    PreDelta,
    /// Let the native increment run, then overwrite the field (primary)
    PostOverwrite,
}

/// What the pre-hook decided for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreOutcome {
    /// Synthetic re-entry, swallowed with no state recorded
    Swallowed,
    /// Guard clause hit (match not active, or team-play owns scoring)
    Ignored,
    /// Call captured for the post-hook
    Captured,
    /// Call captured and the delta argument replaced (PreDelta strategy)
    OverrideDelta(i32),
}

/// Owned pre/post correlation state for the two counter hooks
#[derive(Debug)]
pub struct ScoreInterceptor {
    strategy: Strategy,
    /// Whether this platform's increment path double-invokes the hook
    swallow_reentry: bool,
    /// Call-site id -> player captured at call entry
    pending: HashMap<usize, UserId>,
    /// Per-function reentrancy guard; set means "skip the next pre-hook"
    guard: [bool; 2],
}

impl ScoreInterceptor {
    pub fn new(strategy: Strategy, swallow_reentry: bool) -> Self {
        Self {
            strategy,
            swallow_reentry,
            pending: HashMap::new(),
            guard: [false; 2],
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Pre-hook leg, before the native increment runs.
    pub fn on_pre_increment(
        &mut self,
        func: CounterFn,
        call_site: usize,
        user: UserId,
    ) -> PreOutcome {
        let slot = func.index();

        // A set guard marks this invocation as the engine's own re-entry of
        // the increment path: consume the guard and skip everything else.
        if self.guard[slot] {
            self.guard[slot] = false;
            return PreOutcome::Swallowed;
        }

        if status::match_status() != MatchStatus::Active
            || status::plugin_loaded(TEAMPLAY_PLUGIN)
        {
            return PreOutcome::Ignored;
        }

        // At most one pending entry per live call site; a stale entry from a
        // dropped post-hook is replaced rather than accumulated.
        if self.pending.insert(call_site, user).is_some() {
            tracing::warn!("Replaced stale pending call at site {:#x}", call_site);
        }

        if self.swallow_reentry {
            self.guard[slot] = true;
        }

        if self.strategy == Strategy::PreDelta {
            if let Some(delta) = self.pre_delta(func, user) {
                return PreOutcome::OverrideDelta(delta);
            }
        }

        PreOutcome::Captured
    }

    /// Delta that brings the native counter to the substituted value
    fn pre_delta(&self, func: CounterFn, user: UserId) -> Option<i32> {
        players::with_player(user, |p| match func {
            CounterFn::FragCount => policy::kill_substitute(p).map(|level| level - p.kills),
            CounterFn::DeathCount => policy::death_substitute(p, config::multi_kill_mode())
                .map(|value| value - p.deaths),
        })
        .flatten()
    }

    /// Post-hook leg, after the native increment ran.
    ///
    /// An absent pending entry is a defined no-op: the pre-hook's guard
    /// clause suppressed this call and no stray write may happen.
    pub fn on_post_increment(&mut self, func: CounterFn, call_site: usize) {
        let Some(user) = self.pending.remove(&call_site) else {
            return;
        };

        if self.strategy != Strategy::PostOverwrite {
            // PreDelta already applied its substitution through the delta.
            return;
        }

        players::update_player(user, |p| match func {
            CounterFn::FragCount => {
                if let Some(level) = policy::kill_substitute(p) {
                    p.kills = level;
                }
            }
            CounterFn::DeathCount => {
                // Mode is re-read on every computation; a live config change
                // takes effect immediately.
                if let Some(value) = policy::death_substitute(p, config::multi_kill_mode()) {
                    p.deaths = value;
                }
            }
        });
    }

    /// Clear correlation state and guards (round/match boundary)
    pub fn reset(&mut self) {
        self.pending.clear();
        self.guard = [false; 2];
    }

    /// Number of live pending entries
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }
}

impl Default for ScoreInterceptor {
    fn default() -> Self {
        Self::new(Strategy::PostOverwrite, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::PlayerRecord;
    use crate::policy::MultiKillMode;
    use crate::test_util::GLOBAL_LOCK;

    fn active_solo_match() {
        status::set_match_status(MatchStatus::Active);
        status::set_plugin_loaded(TEAMPLAY_PLUGIN, false);
    }

    fn seed_player(user: UserId, level: i32, multi_kill: i32, level_multi_kill: i32) {
        players::insert_player(
            user,
            PlayerRecord {
                level: Some(level),
                multi_kill,
                level_multi_kill,
                ..Default::default()
            },
        );
    }

    #[test]
    fn test_round_trip_post_overwrite() {
        let _guard = GLOBAL_LOCK.lock();
        active_solo_match();
        config::set_multi_kill(MultiKillMode::Remaining as i32);

        let user = UserId(10);
        seed_player(user, 5, 2, 10);

        let mut icp = ScoreInterceptor::new(Strategy::PostOverwrite, false);
        let outcome = icp.on_pre_increment(CounterFn::FragCount, 0x1000, user);
        assert_eq!(outcome, PreOutcome::Captured);
        icp.on_post_increment(CounterFn::FragCount, 0x1000);

        let outcome = icp.on_pre_increment(CounterFn::DeathCount, 0x1010, user);
        assert_eq!(outcome, PreOutcome::Captured);
        icp.on_post_increment(CounterFn::DeathCount, 0x1010);

        let record = players::player(user).unwrap();
        assert_eq!(record.kills, 5);
        assert_eq!(record.deaths, 8);
        assert_eq!(icp.pending_calls(), 0);

        players::remove_player(user);
    }

    #[test]
    fn test_reentrancy_guard_swallows_exactly_once() {
        let _guard = GLOBAL_LOCK.lock();
        active_solo_match();

        let user = UserId(11);
        seed_player(user, 3, 0, 5);

        let mut icp = ScoreInterceptor::new(Strategy::PostOverwrite, true);
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x2000, user),
            PreOutcome::Captured
        );
        // Synthetic re-entry of the same function: swallowed, nothing recorded
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x2040, user),
            PreOutcome::Swallowed
        );
        assert_eq!(icp.pending_calls(), 1);

        // Third invocation behaves like a fresh call again
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x2080, user),
            PreOutcome::Captured
        );

        players::remove_player(user);
    }

    #[test]
    fn test_guard_is_per_function() {
        let _guard = GLOBAL_LOCK.lock();
        active_solo_match();

        let user = UserId(12);
        seed_player(user, 2, 0, 3);

        let mut icp = ScoreInterceptor::new(Strategy::PostOverwrite, true);
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x3000, user),
            PreOutcome::Captured
        );
        // The death-count guard is independent of the frag-count guard
        assert_eq!(
            icp.on_pre_increment(CounterFn::DeathCount, 0x3040, user),
            PreOutcome::Captured
        );

        players::remove_player(user);
    }

    #[test]
    fn test_unknown_call_site_writes_nothing() {
        let _guard = GLOBAL_LOCK.lock();
        active_solo_match();
        config::set_multi_kill(MultiKillMode::Absolute as i32);

        let user = UserId(13);
        seed_player(user, 4, 2, 6);
        let before = players::player(user).unwrap();

        let mut icp = ScoreInterceptor::new(Strategy::PostOverwrite, false);
        icp.on_post_increment(CounterFn::FragCount, 0xdead);
        icp.on_post_increment(CounterFn::DeathCount, 0xbeef);

        assert_eq!(players::player(user).unwrap(), before);
        players::remove_player(user);
    }

    #[test]
    fn test_guard_clauses_suppress_capture() {
        let _guard = GLOBAL_LOCK.lock();
        let user = UserId(14);
        seed_player(user, 4, 0, 6);

        let mut icp = ScoreInterceptor::new(Strategy::PostOverwrite, false);

        status::set_match_status(MatchStatus::Warmup);
        status::set_plugin_loaded(TEAMPLAY_PLUGIN, false);
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x4000, user),
            PreOutcome::Ignored
        );

        status::set_match_status(MatchStatus::Active);
        status::set_plugin_loaded(TEAMPLAY_PLUGIN, true);
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x4000, user),
            PreOutcome::Ignored
        );
        assert_eq!(icp.pending_calls(), 0);

        // The matching post-hooks are silent no-ops
        icp.on_post_increment(CounterFn::FragCount, 0x4000);

        status::set_plugin_loaded(TEAMPLAY_PLUGIN, false);
        players::remove_player(user);
    }

    #[test]
    fn test_pre_delta_strategy() {
        let _guard = GLOBAL_LOCK.lock();
        active_solo_match();
        config::set_multi_kill(MultiKillMode::Remaining as i32);

        let user = UserId(15);
        players::insert_player(
            user,
            PlayerRecord {
                level: Some(6),
                kills: 2,
                deaths: 1,
                multi_kill: 3,
                level_multi_kill: 10,
                ..Default::default()
            },
        );

        let mut icp = ScoreInterceptor::new(Strategy::PreDelta, false);
        // Frag delta brings kills (2) up to level (6)
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x5000, user),
            PreOutcome::OverrideDelta(4)
        );
        // Death delta brings deaths (1) up to remaining (10 - 3 = 7)
        assert_eq!(
            icp.on_pre_increment(CounterFn::DeathCount, 0x5040, user),
            PreOutcome::OverrideDelta(6)
        );

        // Post-hooks only consume correlation state in this strategy
        let before = players::player(user).unwrap();
        icp.on_post_increment(CounterFn::FragCount, 0x5000);
        icp.on_post_increment(CounterFn::DeathCount, 0x5040);
        assert_eq!(players::player(user).unwrap(), before);
        assert_eq!(icp.pending_calls(), 0);

        players::remove_player(user);
    }

    #[test]
    fn test_pre_delta_without_level_captures_plain() {
        let _guard = GLOBAL_LOCK.lock();
        active_solo_match();

        let user = UserId(16);
        players::insert_player(user, PlayerRecord::default());

        let mut icp = ScoreInterceptor::new(Strategy::PreDelta, false);
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x6000, user),
            PreOutcome::Captured
        );

        players::remove_player(user);
    }

    #[test]
    fn test_reset_clears_pending_and_guards() {
        let _guard = GLOBAL_LOCK.lock();
        active_solo_match();

        let user = UserId(17);
        seed_player(user, 2, 0, 3);

        let mut icp = ScoreInterceptor::new(Strategy::PostOverwrite, true);
        icp.on_pre_increment(CounterFn::FragCount, 0x7000, user);
        assert_eq!(icp.pending_calls(), 1);

        icp.reset();
        assert_eq!(icp.pending_calls(), 0);
        // Guard was cleared too: the next pre-hook is not swallowed
        assert_eq!(
            icp.on_pre_increment(CounterFn::FragCount, 0x7040, user),
            PreOutcome::Captured
        );

        players::remove_player(user);
    }
}

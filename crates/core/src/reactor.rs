//! Event reactor
//!
//! Synchronizes score fields outside the hook path, so the scoreboard stays
//! correct across events the counter hooks cannot observe: spawns, explicit
//! level changes, and round boundaries. Handlers are bound through an
//! explicit subscription table built at startup.

use crate::attributes::{self, AttributeHookKey, MULTI_KILL};
use crate::config;
use crate::events::{
    register_typed_event, EventKey, EventLevelDown, EventLevelUp, EventPlayerSpawn, EventRoundEnd,
    EventRoundStart, EventTeamLevelUp, GameEvent,
};
use crate::hooks;
use crate::players::{self, UserId};
use crate::policy;
use crate::status::{self, MatchStatus, TEAMPLAY_PLUGIN};
use crate::teams;

/// Keys for everything the reactor registered, held for uninstall
#[derive(Debug, Default)]
pub struct ReactorSubscriptions {
    event_keys: Vec<EventKey>,
    attribute_key: Option<AttributeHookKey>,
}

/// Build the subscription table: one handler per consumed event, plus the
/// multi-kill attribute hook.
pub fn install() -> ReactorSubscriptions {
    let mut subs = ReactorSubscriptions::default();

    subs.event_keys
        .push(register_typed_event::<EventRoundStart, _>(|_| {
            on_round_boundary();
        }));
    subs.event_keys
        .push(register_typed_event::<EventRoundEnd, _>(|_| {
            on_round_boundary();
        }));
    subs.event_keys
        .push(register_typed_event::<EventPlayerSpawn, _>(|event| {
            on_player_spawn(UserId(event.userid));
        }));
    subs.event_keys
        .push(register_typed_event::<EventLevelUp, _>(|event| {
            on_player_leveled(UserId(event.leveler));
        }));
    subs.event_keys
        .push(register_typed_event::<EventLevelDown, _>(|event| {
            on_player_leveled(UserId(event.leveler));
        }));
    subs.event_keys
        .push(register_typed_event::<EventTeamLevelUp, _>(|event| {
            on_team_leveled(event.team, event.new_level);
        }));

    subs.attribute_key = Some(attributes::register_attribute_hook(
        MULTI_KILL,
        |user, _old, _new| on_multi_kill_changed(user),
    ));

    tracing::info!(
        "Reactor installed: {} event handlers + {} attribute hook",
        subs.event_keys.len(),
        MULTI_KILL
    );
    subs
}

/// Tear down everything [`install`] registered
pub fn uninstall(subs: ReactorSubscriptions) {
    for key in subs.event_keys {
        crate::events::unregister_event(key);
    }
    if let Some(key) = subs.attribute_key {
        attributes::remove_attribute_hook(key);
    }
    tracing::info!("Reactor uninstalled");
}

/// Round boundary: reset hook correlation state, then push team aggregate
/// levels onto the team-manager entities for team matches.
fn on_round_boundary() {
    // Stale pending calls and guards must not survive into the next round.
    hooks::reset_interceptor();

    if status::match_status() != MatchStatus::Active {
        return;
    }
    if !status::is_team_game() {
        return;
    }

    teams::sync_team_scores();
}

/// Spawn: re-assert the spawning player's substituted score fields.
fn on_player_spawn(user: UserId) {
    if status::match_status() != MatchStatus::Active {
        return;
    }
    if status::plugin_loaded(TEAMPLAY_PLUGIN) {
        return;
    }

    players::update_player(user, |p| {
        let Some(level) = policy::kill_substitute(p) else {
            return;
        };
        p.kills = level;
        if let Some(value) = policy::death_substitute(p, config::multi_kill_mode()) {
            p.deaths = value;
        }
    });
}

/// Level changed (up or down): kills mirror the new level.
fn on_player_leveled(user: UserId) {
    if status::plugin_loaded(TEAMPLAY_PLUGIN) {
        return;
    }

    players::update_player(user, |p| {
        if let Some(level) = policy::kill_substitute(p) {
            p.kills = level;
        }
    });
}

/// Team leveled: push the new level onto the first matching team entity.
fn on_team_leveled(team: i32, new_level: i32) {
    if !teams::set_first_team_score(team, new_level) {
        tracing::debug!("No team-manager entity for team {}", team);
    }
}

/// Multi-kill progress changed: reflect it on the death counter right away
/// rather than waiting for the next increment.
fn on_multi_kill_changed(user: UserId) {
    if status::plugin_loaded(TEAMPLAY_PLUGIN) {
        return;
    }

    players::update_player(user, |p| {
        if let Some(value) = policy::death_substitute(p, config::multi_kill_mode()) {
            p.deaths = value;
        }
    });
}

/// Names of every event the reactor consumes
pub fn consumed_events() -> [&'static str; 6] {
    [
        EventRoundStart::NAME,
        EventRoundEnd::NAME,
        EventPlayerSpawn::NAME,
        EventLevelUp::NAME,
        EventLevelDown::NAME,
        EventTeamLevelUp::NAME,
    ]
}

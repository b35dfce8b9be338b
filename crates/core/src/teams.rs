//! Team level aggregates and team-manager entities
//!
//! Team-based variants show the team's aggregate level on the scoreboard
//! instead of per-player scores. The aggregate map is owned by the leveling
//! logic; this core only reads it and pushes values onto the score field of
//! team-manager entities at round boundaries.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

/// Entity class names that represent a team on the scoreboard.
///
/// Multiple entities may share a class and team id; for direct team-level
/// pushes only the first match is authoritative for display.
pub const TEAM_MANAGER_CLASSES: &[&str] = &["cs_team_manager", "team_manager"];

new_key_type! {
    /// Key for a registered team-manager entity
    pub struct TeamEntityKey;
}

/// A scoreboard-visible team entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamManagerEntity {
    /// Entity class name, matched against [`TEAM_MANAGER_CLASSES`]
    pub class_name: String,
    /// Team identifier
    pub team: i32,
    /// Scoreboard score field
    pub score: i32,
}

static TEAM_LEVELS: LazyLock<RwLock<HashMap<i32, i32>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static TEAM_ENTITIES: LazyLock<RwLock<SlotMap<TeamEntityKey, TeamManagerEntity>>> =
    LazyLock::new(|| RwLock::new(SlotMap::with_key()));

/// Get the aggregate level for a team
pub fn team_level(team: i32) -> Option<i32> {
    TEAM_LEVELS.read().get(&team).copied()
}

/// Set the aggregate level for a team
pub fn set_team_level(team: i32, level: i32) {
    TEAM_LEVELS.write().insert(team, level);
}

/// Snapshot the whole aggregate map
pub fn team_levels() -> HashMap<i32, i32> {
    TEAM_LEVELS.read().clone()
}

/// Clear the aggregate map (match teardown)
pub fn clear_team_levels() {
    TEAM_LEVELS.write().clear();
}

/// Register a team-manager entity, returning its key
pub fn register_team_entity(class_name: &str, team: i32) -> TeamEntityKey {
    TEAM_ENTITIES.write().insert(TeamManagerEntity {
        class_name: class_name.to_string(),
        team,
        score: 0,
    })
}

/// Remove a team-manager entity
pub fn remove_team_entity(key: TeamEntityKey) -> bool {
    TEAM_ENTITIES.write().remove(key).is_some()
}

/// Snapshot a team entity
pub fn team_entity(key: TeamEntityKey) -> Option<TeamManagerEntity> {
    TEAM_ENTITIES.read().get(key).cloned()
}

fn is_team_manager(entity: &TeamManagerEntity) -> bool {
    TEAM_MANAGER_CLASSES.contains(&entity.class_name.as_str())
}

/// Push aggregate levels onto every team-manager entity whose team has a
/// known level. Entities on teams absent from the map are untouched.
pub fn sync_team_scores() {
    let levels = team_levels();
    let mut entities = TEAM_ENTITIES.write();
    for entity in entities.values_mut() {
        if !is_team_manager(entity) {
            continue;
        }
        if let Some(&level) = levels.get(&entity.team) {
            entity.score = level;
        }
    }
}

/// Set the score on the first team-manager entity matching `team`.
///
/// Multiple entities may share a team id; only the first found is updated.
/// Returns `true` if an entity was written.
pub fn set_first_team_score(team: i32, score: i32) -> bool {
    let mut entities = TEAM_ENTITIES.write();
    for entity in entities.values_mut() {
        if !is_team_manager(entity) || entity.team != team {
            continue;
        }
        entity.score = score;
        return true;
    }
    false
}

/// Clear all registered team entities (map teardown and tests)
pub fn clear_team_entities() {
    TEAM_ENTITIES.write().clear();
}

//! ggscore - GunGame scoreboard reflection
//!
//! Reflects each player's GunGame level onto the native scoreboard fields:
//! the kill counter tracks the player's level and the death counter can
//! optionally track multi-kill progress. The native counter-increment
//! functions are intercepted so game logic keeps its semantics while the
//! scoreboard-visible values are substituted; game and GunGame events
//! re-synchronize the fields outside the hook path.

use std::path::PathBuf;

use tracing::info;

pub mod attributes;
pub mod config;
pub mod events;
pub mod gamedata;
pub mod hooks;
pub mod players;
pub mod policy;
pub mod reactor;
pub mod status;
pub mod teams;

// Re-export commonly used items
pub use config::{multi_kill_mode, ConfigError, PluginConfig, ScoreboardConfig};
pub use events::{fire_event, register_event, unregister_event, EventPayload};
pub use gamedata::{Gamedata, GamedataError, DEATH_COUNT_ENTRY, FRAG_COUNT_ENTRY};
pub use hooks::{CounterFn, ModuleImage, PreOutcome, ScoreInterceptor, Strategy};
pub use players::{PlayerRecord, UserId};
pub use policy::{death_substitute, kill_substitute, MultiKillMode};
pub use status::{MatchStatus, TEAMPLAY_PLUGIN};

use parking_lot::Mutex;

/// Errors that can abort plugin load
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Gamedata(#[from] GamedataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything [`init`] needs from the host
#[derive(Debug)]
pub struct InitOptions {
    /// Game folder name, keys the gamedata file (e.g. "cstrike")
    pub game: String,
    /// Path to the gamedata JSON file
    pub gamedata_path: PathBuf,
    /// Server module image, required for signature-scan resolution
    pub module: Option<ModuleImage>,
    /// Substitution strategy; `PostOverwrite` unless the host asks otherwise
    pub strategy: Strategy,
    /// Whether this platform's increment path double-invokes the hook.
    /// `None` selects the per-platform default.
    pub swallow_reentry: Option<bool>,
}

impl InitOptions {
    pub fn new(game: impl Into<String>, gamedata_path: impl Into<PathBuf>) -> Self {
        Self {
            game: game.into(),
            gamedata_path: gamedata_path.into(),
            module: None,
            strategy: Strategy::PostOverwrite,
            swallow_reentry: None,
        }
    }
}

/// Reactor subscriptions held between init and shutdown
static SUBSCRIPTIONS: Mutex<Option<reactor::ReactorSubscriptions>> = Mutex::new(None);

/// Initialize the plugin.
///
/// Loads configuration, resolves the two counter entry points from gamedata
/// (fatal if the game/platform combination is unsupported), wires the
/// detours, and installs the reactor subscription table. The host patches
/// the resolved targets to [`hooks::detour_entry`] and hands the original
/// pointers back through [`hooks::set_original`].
pub fn init(options: InitOptions) -> Result<(), InitError> {
    let cfg = ScoreboardConfig::load()?;
    config::apply(&cfg);

    let platform = gamedata::current_platform();
    let gd = Gamedata::load_from_file(&options.gamedata_path, &options.game, platform)?;

    let frag_address = hooks::resolve_call_point(
        FRAG_COUNT_ENTRY,
        gd.entry(FRAG_COUNT_ENTRY)?,
        options.module,
    )?;
    let death_address = hooks::resolve_call_point(
        DEATH_COUNT_ENTRY,
        gd.entry(DEATH_COUNT_ENTRY)?,
        options.module,
    )?;

    hooks::set_target(CounterFn::FragCount, frag_address);
    hooks::set_target(CounterFn::DeathCount, death_address);

    // The engine's increment path on Windows recursively re-invokes itself,
    // so one synthetic re-entry per logical call must be swallowed there.
    let swallow = options
        .swallow_reentry
        .unwrap_or(cfg!(target_os = "windows"));
    hooks::configure_interceptor(options.strategy, swallow);

    *SUBSCRIPTIONS.lock() = Some(reactor::install());

    info!(
        "ggscore initialized for {}/{} ({:?} strategy)",
        options.game, platform, options.strategy
    );
    Ok(())
}

/// Shut down the plugin: drop subscriptions, detour state, and registries.
pub fn shutdown() {
    if let Some(subs) = SUBSCRIPTIONS.lock().take() {
        reactor::uninstall(subs);
    }
    hooks::clear_detours();
    attributes::clear_attribute_hooks();
    players::clear_players();
    teams::clear_team_entities();
    teams::clear_team_levels();
    status::reset_status();
    info!("ggscore shut down");
}

#[cfg(test)]
pub(crate) mod test_util {
    use parking_lot::Mutex;

    /// Serializes tests that touch process-wide state (match status, the
    /// plugin registry, team entities, the live config cell).
    pub static GLOBAL_LOCK: Mutex<()> = Mutex::new(());
}

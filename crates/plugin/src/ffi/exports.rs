//! C-compatible exports called by the host loader
//!
//! The loader drives the whole lifecycle: it calls `ggscore_plugin_load`
//! with the game name, the gamedata path, and the server module image, asks
//! for the detour entry points, patches the resolved targets itself, hands
//! the original pointers back, and afterwards feeds game events and state
//! updates into the plugin through the remaining exports.

use std::ffi::{c_char, c_int, c_void, CStr};

use ggscore_core::{
    events, hooks, players, status, teams, CounterFn, EventPayload, InitOptions, ModuleImage,
    UserId,
};

// Plugin metadata - static strings with null terminators for C compatibility
static AUTHOR: &[u8] = b"ggscore contributors\0";
static NAME: &[u8] = b"GunGame Scoreboard\0";
static DESCRIPTION: &[u8] = b"Shows GunGame levels on the native scoreboard\0";
static VERSION: &[u8] = b"0.1.0\0";
static LICENSE: &[u8] = b"MIT\0";

/// Write an error message into the host-provided buffer
unsafe fn write_error(error: *mut c_char, maxlen: usize, message: &str) {
    if error.is_null() || maxlen == 0 {
        return;
    }
    let bytes = message.as_bytes();
    let len = bytes.len().min(maxlen - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, error, len);
    *error.add(len) = 0;
}

unsafe fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(str::to_owned)
}

/// Called when the plugin is loaded by the host
///
/// # Safety
/// - `game` and `gamedata_path` must be valid null-terminated strings
/// - `module_base`/`module_len` must describe the mapped server module, or
///   both be zero on platforms resolving by symbol
/// - `error` must point to a buffer of at least `maxlen` bytes, or be null
#[no_mangle]
pub unsafe extern "C" fn ggscore_plugin_load(
    game: *const c_char,
    gamedata_path: *const c_char,
    module_base: usize,
    module_len: usize,
    error: *mut c_char,
    maxlen: usize,
) -> bool {
    // Initialize tracing subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("ggscore loading...");

    let (Some(game), Some(gamedata_path)) = (read_str(game), read_str(gamedata_path)) else {
        write_error(error, maxlen, "game or gamedata path is null");
        return false;
    };

    let mut options = InitOptions::new(game, gamedata_path);
    if module_base != 0 && module_len != 0 {
        options.module = Some(ModuleImage::new(module_base, module_len));
    }

    match ggscore_core::init(options) {
        Ok(()) => {
            tracing::info!("ggscore loaded successfully");
            true
        }
        Err(e) => {
            tracing::error!("Failed to load ggscore: {}", e);
            write_error(error, maxlen, &format!("{}", e));
            false
        }
    }
}

/// Called when the plugin is unloaded by the host
///
/// # Safety
/// - `error` must point to a buffer of at least `maxlen` bytes, or be null
#[no_mangle]
pub unsafe extern "C" fn ggscore_plugin_unload(error: *mut c_char, maxlen: usize) -> bool {
    tracing::info!("ggscore unloading...");

    match std::panic::catch_unwind(crate::shutdown) {
        Ok(()) => true,
        Err(_) => {
            write_error(error, maxlen, "Panic during shutdown");
            false
        }
    }
}

fn counter_fn(func: c_int) -> Option<CounterFn> {
    match func {
        0 => Some(CounterFn::FragCount),
        1 => Some(CounterFn::DeathCount),
        _ => None,
    }
}

/// Resolved target address for a counter function (0 if unresolved).
/// `func`: 0 = frag count, 1 = death count.
#[no_mangle]
pub extern "C" fn ggscore_hook_target(func: c_int) -> usize {
    counter_fn(func)
        .and_then(hooks::target)
        .unwrap_or(0)
}

/// Detour entry point the loader should patch the target to
#[no_mangle]
pub extern "C" fn ggscore_detour_entry(func: c_int) -> *const c_void {
    match counter_fn(func) {
        Some(func) => hooks::detour_entry(func) as *const c_void,
        None => std::ptr::null(),
    }
}

/// Original-function pointer handed back by the loader after patching
///
/// # Safety
/// `original` must be callable with the counter-function ABI.
#[no_mangle]
pub unsafe extern "C" fn ggscore_set_original(func: c_int, original: *const c_void) {
    if let Some(func) = counter_fn(func) {
        hooks::set_original(func, original as *const ());
    }
}

/// Fire a named game event into the plugin.
///
/// `payload_json` is a flat JSON object; integers, booleans, floats, and
/// strings are carried over, everything else is ignored.
///
/// # Safety
/// `name` must be a valid null-terminated string; `payload_json` may be null.
#[no_mangle]
pub unsafe extern "C" fn ggscore_fire_event(name: *const c_char, payload_json: *const c_char) {
    let Some(name) = read_str(name) else {
        return;
    };

    let mut payload = EventPayload::new();
    if let Some(json) = read_str(payload_json) {
        match serde_json::from_str::<serde_json::Value>(&json) {
            Ok(serde_json::Value::Object(map)) => {
                for (key, value) in map {
                    match value {
                        serde_json::Value::Bool(v) => payload.set_bool(&key, v),
                        serde_json::Value::Number(v) => {
                            if let Some(i) = v.as_i64() {
                                payload.set_int(&key, i as i32);
                            } else if let Some(f) = v.as_f64() {
                                payload.set_float(&key, f as f32);
                            }
                        }
                        serde_json::Value::String(v) => payload.set_str(&key, &v),
                        _ => {}
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Bad payload for event '{}': {}", name, e);
                return;
            }
        }
    }

    events::fire_event(&name, &payload);
}

/// Update the current match phase (see `MatchStatus` discriminants)
#[no_mangle]
pub extern "C" fn ggscore_set_match_status(phase: c_int) {
    status::set_match_status(status::MatchStatus::from(phase as u8));
}

/// Mark a sibling plugin as loaded or unloaded
///
/// # Safety
/// `name` must be a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ggscore_set_plugin_loaded(name: *const c_char, loaded: bool) {
    if let Some(name) = read_str(name) {
        status::set_plugin_loaded(&name, loaded);
    }
}

/// Set the team-game flag for the current match
#[no_mangle]
pub extern "C" fn ggscore_set_team_game(team_game: bool) {
    status::set_team_game(team_game);
}

/// Insert or replace a player record. `level < 0` means "no level yet".
#[no_mangle]
pub extern "C" fn ggscore_upsert_player(
    userid: c_int,
    level: c_int,
    kills: c_int,
    deaths: c_int,
    multi_kill: c_int,
    level_multi_kill: c_int,
    team: c_int,
) {
    players::insert_player(
        UserId(userid),
        players::PlayerRecord {
            level: if level < 0 { None } else { Some(level) },
            kills,
            deaths,
            multi_kill,
            level_multi_kill,
            team,
        },
    );
}

/// Drop a player record and its entity binding
#[no_mangle]
pub extern "C" fn ggscore_remove_player(userid: c_int) {
    players::remove_player(UserId(userid));
}

/// Associate a native entity instance with its owning player
///
/// # Safety
/// `instance` must identify a live entity for as long as it stays bound.
#[no_mangle]
pub unsafe extern "C" fn ggscore_bind_entity(instance: *const c_void, userid: c_int) {
    players::bind_entity(instance as usize, UserId(userid));
}

/// Update a player's multi-kill progress, firing attribute hooks
#[no_mangle]
pub extern "C" fn ggscore_set_multi_kill(userid: c_int, value: c_int) {
    players::set_multi_kill(UserId(userid), value);
}

/// Set a team's aggregate level
#[no_mangle]
pub extern "C" fn ggscore_set_team_level(team: c_int, level: c_int) {
    teams::set_team_level(team, level);
}

// Metadata exports - these return static strings for the host to display

#[no_mangle]
pub extern "C" fn ggscore_get_author() -> *const c_char {
    AUTHOR.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn ggscore_get_name() -> *const c_char {
    NAME.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn ggscore_get_description() -> *const c_char {
    DESCRIPTION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn ggscore_get_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn ggscore_get_license() -> *const c_char {
    LICENSE.as_ptr() as *const c_char
}

//! Engine-facing counter detours
//!
//! These are the functions the host loader patches the resolved entry points
//! to. The host ABI is fixed (instance pointer plus integer delta) and is
//! preserved exactly: the detour runs the pre-hook, forwards to the original
//! function, then runs the post-hook. Original-function pointers are handed
//! back by the loader after patching and held in atomics.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::LazyLock;

use parking_lot::RwLock;

use super::interceptor::{CounterFn, PreOutcome, ScoreInterceptor, Strategy};
use crate::players;

/// Host ABI of the two counter functions
pub type IncrementFn = unsafe extern "C" fn(*mut c_void, i32);

/// The owned interceptor instance shared by both detours
static INTERCEPTOR: LazyLock<RwLock<ScoreInterceptor>> =
    LazyLock::new(|| RwLock::new(ScoreInterceptor::default()));

static ORIGINAL_FRAG: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());
static ORIGINAL_DEATH: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());

static TARGET_FRAG: AtomicUsize = AtomicUsize::new(0);
static TARGET_DEATH: AtomicUsize = AtomicUsize::new(0);

/// Replace the interceptor with one configured for this platform
pub fn configure_interceptor(strategy: Strategy, swallow_reentry: bool) {
    *INTERCEPTOR.write() = ScoreInterceptor::new(strategy, swallow_reentry);
    tracing::debug!(
        "Interceptor configured: {:?}, swallow_reentry={}",
        strategy,
        swallow_reentry
    );
}

/// Run a closure against the shared interceptor
pub fn with_interceptor<R>(f: impl FnOnce(&mut ScoreInterceptor) -> R) -> R {
    f(&mut INTERCEPTOR.write())
}

/// Clear correlation state and guards (round/match boundary)
pub fn reset_interceptor() {
    INTERCEPTOR.write().reset();
}

fn original_slot(func: CounterFn) -> &'static AtomicPtr<c_void> {
    match func {
        CounterFn::FragCount => &ORIGINAL_FRAG,
        CounterFn::DeathCount => &ORIGINAL_DEATH,
    }
}

fn target_slot(func: CounterFn) -> &'static AtomicUsize {
    match func {
        CounterFn::FragCount => &TARGET_FRAG,
        CounterFn::DeathCount => &TARGET_DEATH,
    }
}

/// Record the resolved entry-point address for a counter function
pub fn set_target(func: CounterFn, address: usize) {
    target_slot(func).store(address, Ordering::Release);
    tracing::info!("Target for {:?} at {:#x}", func, address);
}

/// The resolved entry-point address, if set
pub fn target(func: CounterFn) -> Option<usize> {
    match target_slot(func).load(Ordering::Acquire) {
        0 => None,
        address => Some(address),
    }
}

/// Store the original-function pointer handed back by the loader
pub fn set_original(func: CounterFn, original: *const ()) {
    original_slot(func).store(original as *mut c_void, Ordering::Release);
}

/// The detour entry point for `func`, handed to the loader for patching
pub fn detour_entry(func: CounterFn) -> *const () {
    match func {
        CounterFn::FragCount => increment_frag_detour as *const (),
        CounterFn::DeathCount => increment_death_detour as *const (),
    }
}

/// Forget targets and originals (plugin unload)
pub fn clear_detours() {
    ORIGINAL_FRAG.store(ptr::null_mut(), Ordering::Release);
    ORIGINAL_DEATH.store(ptr::null_mut(), Ordering::Release);
    TARGET_FRAG.store(0, Ordering::Release);
    TARGET_DEATH.store(0, Ordering::Release);
    INTERCEPTOR.write().reset();
}

/// Detour body shared by both counter functions.
///
/// The call-site id is the address of a stack local in this frame: stable
/// for the duration of the call and equal between the pre and post legs,
/// since both run here.
unsafe fn dispatch(func: CounterFn, this: *mut c_void, delta: i32) {
    let frame_marker = 0u8;
    let call_site = &frame_marker as *const u8 as usize;

    let original = original_slot(func).load(Ordering::Acquire);

    let Some(user) = players::user_from_entity(this as usize) else {
        // Unknown instance: pass the call through untouched.
        if !original.is_null() {
            let original: IncrementFn = std::mem::transmute(original);
            original(this, delta);
        }
        return;
    };

    let outcome = INTERCEPTOR.write().on_pre_increment(func, call_site, user);
    let delta = match outcome {
        PreOutcome::OverrideDelta(value) => value,
        _ => delta,
    };

    // Native semantics are preserved for game logic regardless of outcome;
    // the engine's own recursion also funnels back through here.
    if !original.is_null() {
        let original: IncrementFn = std::mem::transmute(original);
        original(this, delta);
    }

    INTERCEPTOR.write().on_post_increment(func, call_site);
}

/// Detour for the native frag-counter increment
///
/// # Safety
/// Called by the engine with a live entity instance pointer.
pub unsafe extern "C" fn increment_frag_detour(this: *mut c_void, delta: i32) {
    dispatch(CounterFn::FragCount, this, delta);
}

/// Detour for the native death-counter increment
///
/// # Safety
/// Called by the engine with a live entity instance pointer.
pub unsafe extern "C" fn increment_death_detour(this: *mut c_void, delta: i32) {
    dispatch(CounterFn::DeathCount, this, delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::{PlayerRecord, UserId};
    use crate::policy::MultiKillMode;
    use crate::status::{self, MatchStatus, TEAMPLAY_PLUGIN};
    use crate::test_util::GLOBAL_LOCK;
    use crate::config;
    use std::sync::atomic::AtomicI32;

    static NATIVE_CALLS: AtomicI32 = AtomicI32::new(0);
    static NATIVE_DELTA: AtomicI32 = AtomicI32::new(0);

    unsafe extern "C" fn fake_native(_this: *mut c_void, delta: i32) {
        NATIVE_CALLS.fetch_add(1, Ordering::SeqCst);
        NATIVE_DELTA.store(delta, Ordering::SeqCst);
    }

    #[test]
    fn test_detour_round_trip() {
        let _guard = GLOBAL_LOCK.lock();
        status::set_match_status(MatchStatus::Active);
        status::set_plugin_loaded(TEAMPLAY_PLUGIN, false);
        config::set_multi_kill(MultiKillMode::Remaining as i32);
        configure_interceptor(Strategy::PostOverwrite, false);

        let user = UserId(30);
        players::insert_player(
            user,
            PlayerRecord {
                level: Some(5),
                multi_kill: 2,
                level_multi_kill: 10,
                ..Default::default()
            },
        );

        let mut instance = 0u64;
        let this = &mut instance as *mut u64 as *mut c_void;
        players::bind_entity(this as usize, user);

        set_original(CounterFn::FragCount, fake_native as *const ());
        set_original(CounterFn::DeathCount, fake_native as *const ());

        NATIVE_CALLS.store(0, Ordering::SeqCst);
        unsafe {
            increment_frag_detour(this, 1);
            increment_death_detour(this, 1);
        }

        // The native increment ran for both calls, hooks intact
        assert_eq!(NATIVE_CALLS.load(Ordering::SeqCst), 2);

        let record = players::player(user).unwrap();
        assert_eq!(record.kills, 5);
        assert_eq!(record.deaths, 8);
        assert_eq!(with_interceptor(|icp| icp.pending_calls()), 0);

        players::unbind_entity(this as usize);
        players::remove_player(user);
        clear_detours();
    }

    #[test]
    fn test_unknown_instance_passes_through() {
        let _guard = GLOBAL_LOCK.lock();
        configure_interceptor(Strategy::PostOverwrite, false);
        set_original(CounterFn::FragCount, fake_native as *const ());

        let mut instance = 0u64;
        let this = &mut instance as *mut u64 as *mut c_void;

        NATIVE_CALLS.store(0, Ordering::SeqCst);
        NATIVE_DELTA.store(0, Ordering::SeqCst);
        unsafe { increment_frag_detour(this, 3) };

        assert_eq!(NATIVE_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(NATIVE_DELTA.load(Ordering::SeqCst), 3);
        assert_eq!(with_interceptor(|icp| icp.pending_calls()), 0);

        clear_detours();
    }

    #[test]
    fn test_pre_delta_overrides_native_argument() {
        let _guard = GLOBAL_LOCK.lock();
        status::set_match_status(MatchStatus::Active);
        status::set_plugin_loaded(TEAMPLAY_PLUGIN, false);
        configure_interceptor(Strategy::PreDelta, false);

        let user = UserId(31);
        players::insert_player(
            user,
            PlayerRecord {
                level: Some(4),
                kills: 1,
                ..Default::default()
            },
        );

        let mut instance = 0u64;
        let this = &mut instance as *mut u64 as *mut c_void;
        players::bind_entity(this as usize, user);
        set_original(CounterFn::FragCount, fake_native as *const ());

        NATIVE_DELTA.store(0, Ordering::SeqCst);
        unsafe { increment_frag_detour(this, 1) };

        // The native call saw level - kills instead of the engine's delta
        assert_eq!(NATIVE_DELTA.load(Ordering::SeqCst), 3);
        // And the post leg left the record alone in this strategy
        assert_eq!(players::player(user).unwrap().kills, 1);

        players::unbind_entity(this as usize);
        players::remove_player(user);
        clear_detours();
    }

    #[test]
    fn test_detour_targets() {
        let _guard = GLOBAL_LOCK.lock();
        assert_eq!(target(CounterFn::FragCount), None);
        set_target(CounterFn::FragCount, 0x1234);
        assert_eq!(target(CounterFn::FragCount), Some(0x1234));
        clear_detours();
        assert_eq!(target(CounterFn::FragCount), None);
    }
}

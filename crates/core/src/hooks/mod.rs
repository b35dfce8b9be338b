//! Hook system
//!
//! Locates the two native counter-increment entry points from gamedata
//! (signature scan or named symbol, per platform), exposes the detours the
//! host loader patches them to, and owns the pre/post interception state.

pub mod callpoint;
pub mod detour;
pub mod interceptor;

pub use callpoint::{resolve_call_point, CallPointResolver, ModuleImage, NamedSymbol, SignatureScan};
pub use detour::{
    clear_detours, configure_interceptor, detour_entry, reset_interceptor, set_original,
    set_target, target, with_interceptor, IncrementFn,
};
pub use interceptor::{CounterFn, PreOutcome, ScoreInterceptor, Strategy};

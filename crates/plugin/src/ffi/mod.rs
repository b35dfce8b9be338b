//! FFI surface consumed by the host loader

pub mod exports;

//! Logging macros used by the writer and reader drivers.
//!
//! These wrap `tracing` directly. The codec has no browser/WASM target of
//! its own, but the macro shape matches `massive-graph-core`'s cross-platform
//! logging module so that call sites read the same way across the wider
//! codebase this crate was lifted out of.

/// Info level logging — general information messages.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        tracing::info!($($arg)*);
    };
}

/// Warning level logging — potentially problematic situations, such as a
/// swallowed per-key inspection failure during encoding.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        tracing::warn!($($arg)*);
    };
}

/// Debug level logging — per-call encode/decode sizes.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

//! Cross-cutting concerns shared by the encoder and decoder: configuration
//! and logging. Kept separate from the wire-format modules the way
//! `massive-graph-core` keeps its `core` module separate from `types`.

/// Codec configuration surface.
pub mod config;

/// Cross-platform logging macros.
pub mod logging;

pub use config::CodecOptions;

//! Configuration for the dynawire codec.
//!
//! Mirrors `massive-graph-core::core::config`: a plain `serde`-derived
//! struct with a `Default` impl, loadable from an optional TOML file, that
//! falls back to the default with a logged warning rather than failing the
//! caller's startup.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options governing how a [`crate::Codec`] encodes and decodes values.
/// Disabling any option only weakens the encoder; the decoder accepts
/// output produced under any configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Enables `REFERENCE` / `STRING_REF` emission for repeated heap values
    /// and strings longer than three characters.
    pub deduplication: bool,

    /// Enables `BUFFER_REF` across typed-array members that alias the same
    /// backing array buffer.
    pub share_array_buffers: bool,

    /// Enables the packed-array classifier (the numeric-array analyzer).
    pub simd_optimization: bool,

    /// Enables the pre-walk cycle detector. If disabled, a cyclic graph
    /// will recurse until the stack is exhausted — the caller's
    /// responsibility once this is turned off.
    pub detect_circular: bool,

    /// Enables source-text capture for callable values in method-object
    /// bodies. Off by default: reconstructing callables from source text
    /// is a host-trust decision, not something this codec opts into silently.
    pub serialize_functions: bool,

    /// Allows the classifier to choose `OBJECT_WITH_DESCRIPTORS` for
    /// objects carrying non-default property descriptors.
    pub preserve_property_descriptors: bool,

    /// Initial buffer capacity hint, in bytes.
    pub memory_pool_size: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            deduplication: true,
            share_array_buffers: true,
            simd_optimization: true,
            detect_circular: true,
            serialize_functions: false,
            preserve_property_descriptors: true,
            memory_pool_size: 65536,
        }
    }
}

impl CodecOptions {
    /// Load options from a TOML file.
    pub fn from_file(path: &str) -> Result<CodecOptions> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::error::Error::unsupported_value(format!(
                "failed to read config file {path}: {e}"
            ))
        })?;
        let options: CodecOptions = toml::from_str(&contents).map_err(|e| {
            crate::error::Error::unsupported_value(format!(
                "failed to parse config file {path}: {e}"
            ))
        })?;
        Ok(options)
    }

    /// Load options from an optional TOML file, falling back to defaults
    /// (with a logged warning) if the path is absent or fails to load.
    pub fn from_file_or_default(path: Option<&str>) -> CodecOptions {
        match path {
            Some(path) => match Self::from_file(path) {
                Ok(options) => {
                    crate::log_info!("loaded codec options from: {}", path);
                    options
                }
                Err(e) => {
                    crate::log_warn!(
                        "failed to load codec options from {}: {}. Using defaults.",
                        path,
                        e
                    );
                    CodecOptions::default()
                }
            },
            None => CodecOptions::default(),
        }
    }
}

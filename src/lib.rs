//! # dynawire
//!
//! A binary serialization codec for dynamically-typed value graphs: tagged
//! values, alignment-aware buffers, reference-preserving object/array/map/set
//! graphs (including cycles), and a packed representation for homogeneous
//! numeric arrays and typed-array views.
//!
//! This crate is structured the way `massive-graph-core` structures its
//! wire-format layer: small single-purpose modules (buffer, reader, tag,
//! classify, refs) composed by two driver modules (`writer`, `decode`) behind
//! one public entry point, [`Codec`].

#![warn(missing_docs)]

/// Growable, alignment-aware write buffer (C1).
pub mod buffer;

/// Type-classification front end mapping values to wire tags (C6).
pub mod classify;

/// Cross-cutting concerns shared by the encoder and decoder: configuration
/// and logging.
pub mod core;

/// Reader driver: the inverse of the writer driver (C9).
pub mod decode;

/// Codec error type and result alias.
pub mod error;

/// Wire header: magic number and version (C3).
pub mod header;

/// Numeric-array analyzer deciding packed-element eligibility (C5).
pub mod numeric_array;

/// Bounds-checked read cursor mirroring [`buffer::Buffer`] (C2).
pub mod reader;

/// Reference-tracking subsystem: identity tables and cycle detection (C7).
pub mod refs;

/// Wire tag catalogue (C4).
pub mod tag;

/// The dynamic value model this codec serializes.
pub mod value;

/// Writer driver: tag dispatch and payload emission (C8).
pub mod writer;

pub use core::CodecOptions;
pub use error::{Error, Result};
pub use value::Value;

/// The codec's public surface (spec §6.2): two operations over a configured
/// instance, `serialize` and `deserialize`.
///
/// Configuration only ever affects encoding. Decoding is, by design,
/// option-agnostic: a [`Codec`] built with any [`CodecOptions`] can decode a
/// payload produced by a codec built with any other options, so
/// `deserialize` does not consult `self.options` at all (spec §6.2, §9).
#[derive(Debug, Default, Clone)]
pub struct Codec {
    options: CodecOptions,
}

impl Codec {
    /// Build a codec with the given encoder configuration.
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    /// Build a codec with its configuration loaded from a TOML file,
    /// falling back to defaults if the file is absent or unreadable.
    pub fn from_config_file(path: &str) -> Self {
        Self {
            options: CodecOptions::from_file_or_default(Some(path)),
        }
    }

    /// The encoder configuration this codec was built with.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Encode `value` into a wire-format byte buffer.
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>> {
        writer::serialize(value, &self.options)
    }

    /// Decode a wire-format byte buffer back into a value graph.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Value> {
        decode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_round_trips_through_the_public_surface() {
        let codec = Codec::new(CodecOptions::default());
        let value = Value::object(vec![("answer", Value::Number(42.0))]);
        let bytes = codec.serialize(&value).unwrap();
        let decoded = codec.deserialize(&bytes).unwrap();
        let Value::Object(rc) = decoded else {
            panic!("expected object");
        };
        assert_eq!(&*rc.borrow().properties[0].key, "answer");
    }

    #[test]
    fn decoder_is_option_agnostic() {
        let mut opts = CodecOptions::default();
        opts.simd_optimization = true;
        let encoder = Codec::new(opts);
        let decoder = Codec::default();
        let values: Vec<Value> = (1..=16).map(|i| Value::Number(i as f64)).collect();
        let bytes = encoder.serialize(&Value::array(values)).unwrap();
        assert!(decoder.deserialize(&bytes).is_ok());
    }
}

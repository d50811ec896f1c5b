//! Error types and handling for the dynawire codec.
//!
//! This module defines all error types used throughout the crate, matching
//! the six fatal failure kinds of the wire format: bounds violations on
//! read, header/version mismatches, unknown tags, dangling references, and
//! encoder-side values outside the supported domain.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during encoding or decoding. Every variant is
/// fatal to the call in progress; there is no partial result.
#[derive(Error, Debug)]
pub enum Error {
    /// A read requested more bytes than remain in the input.
    #[error("buffer underflow: requested {requested} bytes, {remaining} remaining")]
    BufferUnderflow {
        /// Number of bytes the read attempted to consume.
        requested: usize,
        /// Number of bytes actually left in the input.
        remaining: usize,
    },

    /// The header does not start with the expected magic number.
    #[error("invalid magic: expected {expected:#010x}, found {found:#010x}")]
    InvalidMagic {
        /// The magic value this codec expects.
        expected: u32,
        /// The magic value actually read.
        found: u32,
    },

    /// The version byte does not match the version this codec implements.
    #[error("unsupported format version: {found} (expected {expected})")]
    UnsupportedFormat {
        /// The version byte this codec implements.
        expected: u8,
        /// The version byte actually read.
        found: u8,
    },

    /// A tag byte falls outside the fixed tag enumeration.
    #[error("unknown tag byte: {0:#04x}")]
    UnknownTag(u8),

    /// A reference id is greater than or equal to the current table size.
    #[error("invalid reference: id {id} but table has {table_len} entries")]
    InvalidReference {
        /// The id that was read from the wire.
        id: u32,
        /// The size of the table at the moment of lookup.
        table_len: usize,
    },

    /// An encoder-side input is outside the domain this codec can represent,
    /// e.g. a big integer whose magnitude the wire format cannot carry.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
}

impl Error {
    /// Build an [`Error::UnsupportedValue`] from any displayable reason.
    pub fn unsupported_value(reason: impl Into<String>) -> Self {
        Self::UnsupportedValue(reason.into())
    }
}

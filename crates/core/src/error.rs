//! Error types for meshstore
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Duplicate keys on insert are deliberately absent: the storage insert
//! primitive reports them as `InsertOutcome::AlreadyPresent`.

use crate::value::FieldKind;
use std::io;
use thiserror::Error;

/// Result type alias for meshstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for meshstore
#[derive(Debug, Error)]
pub enum Error {
    /// Target row of a `get` or `update` does not exist
    #[error("{collection} not found: {key}")]
    NotFound {
        /// Collection name
        collection: &'static str,
        /// Primary key that was looked up
        key: String,
    },

    /// A row already exists where at most one may
    #[error("{collection} already exists: {key}")]
    AlreadyExists {
        /// Collection name
        collection: &'static str,
        /// Primary key of the existing row
        key: String,
    },

    /// Query combines features that cannot be executed deterministically
    #[error("Unsupported query shape: {reason}")]
    UnsupportedQueryShape {
        /// Why the shape was rejected
        reason: String,
    },

    /// CONTAINS applied to a field that is not string-valued
    #[error("CONTAINS filter is only valid on string fields, `{field}` is {kind}")]
    InvalidFilterUsage {
        /// Field the filter targets
        field: &'static str,
        /// Actual kind of that field
        kind: FieldKind,
    },

    /// Filter value kind does not match the field kind
    #[error("Filter on `{field}` expects a {expected} value, got {actual}")]
    FilterTypeMismatch {
        /// Field the filter targets
        field: &'static str,
        /// Kind of the field
        expected: FieldKind,
        /// Kind of the supplied value
        actual: FieldKind,
    },

    /// An update function tried to change a primary key
    #[error("Primary key of {collection} {key} cannot be changed by an update")]
    ImmutableKey {
        /// Collection name
        collection: &'static str,
        /// Original primary key
        key: String,
    },

    /// Configuration rejected at open time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation attempted on a closed database
    #[error("Database is closed")]
    DatabaseClosed,

    /// I/O error (snapshot files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected
    #[error("Data corruption: {0}")]
    Corruption(String),
}

impl Error {
    /// Shorthand for a `NotFound` error
    pub fn not_found(collection: &'static str, key: impl ToString) -> Self {
        Error::NotFound {
            collection,
            key: key.to_string(),
        }
    }

    /// Shorthand for an `UnsupportedQueryShape` error
    pub fn unsupported_shape(reason: impl Into<String>) -> Self {
        Error::UnsupportedQueryShape {
            reason: reason.into(),
        }
    }

    /// Whether this error reports a missing row
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

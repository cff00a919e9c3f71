//! Typed field values and the record/field traits
//!
//! Every queryable field of every collection is a variant of a per-collection
//! field enum implementing [`RecordField`]. Records expose their fields through
//! [`Record::field`], which returns a [`FieldValue`]. Comparisons always happen
//! on the stored representation:
//!
//! - `String` values compare lexically (decimal amounts included)
//! - `Integer` values compare numerically
//! - `Boolean` values order `false < true`
//! - `Timestamp` values compare chronologically

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Semantic kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 string, compared lexically
    String,
    /// Unsigned 64-bit integer
    Integer,
    /// Boolean flag
    Boolean,
    /// UTC timestamp
    Timestamp,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single field value as stored
///
/// The derived ordering compares the variant first. Values of one field always
/// share a variant, so within an index this is the natural order of the kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    /// String value
    String(String),
    /// Integer value
    Integer(u64),
    /// Boolean value
    Boolean(bool),
    /// Timestamp value
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Kind of this value
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
        }
    }

    /// Borrow the string payload, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{:?}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(t)
    }
}

/// A queryable field of some collection
///
/// Implemented by the per-collection field enums. Dispatch over fields is a
/// `match` on the enum, never a lookup by name.
pub trait RecordField:
    Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Every field of the collection, in declaration order
    fn all() -> &'static [Self];

    /// External (camelCase) name of the field
    fn name(&self) -> &'static str;

    /// Semantic kind of the field
    fn kind(&self) -> FieldKind;

    /// Whether this field is the collection's primary key
    fn is_primary_key(&self) -> bool;
}

/// A row of some collection
pub trait Record: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Primary key type
    type Key: Clone + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Field enum of the collection
    type Field: RecordField;

    /// Collection name used in errors and logs
    const COLLECTION: &'static str;

    /// Primary key of this row
    fn key(&self) -> Self::Key;

    /// Value of one field of this row
    fn field(&self, field: Self::Field) -> FieldValue;
}

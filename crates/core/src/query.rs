//! Query model
//!
//! A [`Query`] is a fixed shape: a conjunction of filters, a list of sort
//! specs, and optional offset/limit. There is no expression language.
//!
//! `limit` and `offset` of zero mean "unset"; use [`Query::effective_limit`]
//! and [`Query::effective_offset`] rather than reading the fields directly.

use crate::error::{Error, Result};
use crate::value::{FieldKind, FieldValue, RecordField};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Comparison applied by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// `=`
    #[serde(rename = "=")]
    Equal,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqual,
    /// `<`
    #[serde(rename = "<")]
    Less,
    /// `>`
    #[serde(rename = ">")]
    Greater,
    /// `<=`
    #[serde(rename = "<=")]
    LessOrEqual,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// Substring match, string fields only
    #[serde(rename = "CONTAINS")]
    Contains,
}

impl FilterKind {
    /// Whether `actual` (the stored value) satisfies `self` against `expected`
    pub fn matches(&self, actual: &FieldValue, expected: &FieldValue) -> bool {
        match self {
            FilterKind::Equal => actual == expected,
            FilterKind::NotEqual => actual != expected,
            FilterKind::Less => actual < expected,
            FilterKind::Greater => actual > expected,
            FilterKind::LessOrEqual => actual <= expected,
            FilterKind::GreaterOrEqual => actual >= expected,
            FilterKind::Contains => match (actual.as_str(), expected.as_str()) {
                (Some(haystack), Some(needle)) => haystack.contains(needle),
                _ => false,
            },
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            FilterKind::Equal => "=",
            FilterKind::NotEqual => "!=",
            FilterKind::Less => "<",
            FilterKind::Greater => ">",
            FilterKind::LessOrEqual => "<=",
            FilterKind::GreaterOrEqual => ">=",
            FilterKind::Contains => "CONTAINS",
        };
        f.write_str(symbol)
    }
}

/// A single filter condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "F: RecordField")]
pub struct Filter<F> {
    /// Field to test
    pub field: F,
    /// Comparison
    pub kind: FilterKind,
    /// Right-hand side
    pub value: FieldValue,
}

impl<F: RecordField> Filter<F> {
    /// Create a filter
    pub fn new(field: F, kind: FilterKind, value: impl Into<FieldValue>) -> Self {
        Self {
            field,
            kind,
            value: value.into(),
        }
    }

    /// Check the filter is meaningful for its field
    pub fn validate(&self) -> Result<()> {
        let kind = self.field.kind();
        if self.kind == FilterKind::Contains && kind != FieldKind::String {
            return Err(Error::InvalidFilterUsage {
                field: self.field.name(),
                kind,
            });
        }
        if self.value.kind() != kind {
            return Err(Error::FilterTypeMismatch {
                field: self.field.name(),
                expected: kind,
                actual: self.value.kind(),
            });
        }
        Ok(())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Natural order
    #[default]
    Asc,
    /// Reversed natural order
    Desc,
}

impl SortDirection {
    /// Apply this direction to an ascending comparison result
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// One key of a multi-field sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "F: RecordField")]
pub struct SortSpec<F> {
    /// Field to sort by
    pub field: F,
    /// Direction
    pub direction: SortDirection,
}

impl<F: RecordField> SortSpec<F> {
    /// Create a sort spec
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Structured query over a collection whose fields are `F`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "F: RecordField")]
pub struct Query<F> {
    /// Conjunction of filters
    #[serde(default)]
    pub filters: Vec<Filter<F>>,
    /// Sort keys, most significant first
    #[serde(default)]
    pub sort: Vec<SortSpec<F>>,
    /// Maximum rows to return; `None` or zero means no limit
    #[serde(default)]
    pub limit: Option<usize>,
    /// Rows to skip; `None` or zero means no offset
    #[serde(default)]
    pub offset: Option<usize>,
}

impl<F> Default for Query<F> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

impl<F: RecordField> Query<F> {
    /// Empty query: the whole collection in storage order
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter
    pub fn filter(mut self, field: F, kind: FilterKind, value: impl Into<FieldValue>) -> Self {
        self.filters.push(Filter::new(field, kind, value));
        self
    }

    /// Add a sort key
    pub fn sort(mut self, field: F, direction: SortDirection) -> Self {
        self.sort.push(SortSpec::new(field, direction));
        self
    }

    /// Set the limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the offset
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Limit with zero normalized to `None`
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|&n| n > 0)
    }

    /// Offset with `None` normalized to zero
    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Whether an offset or a limit is in effect
    pub fn is_sliced(&self) -> bool {
        self.effective_limit().is_some() || self.effective_offset() > 0
    }

    /// Whether this query has no filters, sort or slicing
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.sort.is_empty() && !self.is_sliced()
    }

    /// Whether the filters are exactly one `=` on the primary key
    pub fn is_primary_key_lookup(&self) -> bool {
        matches!(
            self.filters.as_slice(),
            [f] if f.kind == FilterKind::Equal && f.field.is_primary_key()
        )
    }

    /// Validate every filter
    ///
    /// Fails with `InvalidFilterUsage` for CONTAINS on a non-string field and
    /// with `FilterTypeMismatch` when a value's kind differs from its field.
    pub fn validate(&self) -> Result<()> {
        self.filters.iter().try_for_each(Filter::validate)
    }

    /// Apply offset then limit to an already filtered and ordered sequence
    pub fn slice<T>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        let iter = rows.into_iter().skip(self.effective_offset());
        match self.effective_limit() {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

//! Query planner
//!
//! Decides whether a query can be answered by one native index scan or must
//! go through the in-memory evaluator.
//!
//! A query is native-eligible iff:
//! 1. it has at most one sort spec
//! 2. it has at most one filter
//! 3. a filter and a sort, when both present, target the same field
//! 4. its filter (if any) is not `CONTAINS`
//!
//! Before any of that, the query is validated and its shape checked: more than
//! one sort key combined with offset/limit is rejected unless the filters pin
//! a single primary key.

use meshstore_core::{Error, FilterKind, Query, RecordField, Result, SortSpec};
use meshstore_storage::IndexRange;
use std::fmt;

/// Why a query cannot use the native path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// More than one sort spec
    MultipleSorts,
    /// More than one filter
    MultipleFilters,
    /// Filter and sort target different fields
    MixedFields,
    /// No substring index exists
    ContainsFilter,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FallbackReason::MultipleSorts => "multi-field sort",
            FallbackReason::MultipleFilters => "compound filter",
            FallbackReason::MixedFields => "filter and sort on different fields",
            FallbackReason::ContainsFilter => "CONTAINS filter",
        };
        f.write_str(reason)
    }
}

/// Plan executed directly against one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativePlan<F> {
    /// Index range selected by the single filter, if any
    pub scan: Option<(F, IndexRange)>,
    /// Index order to iterate, if a sort was requested
    pub order: Option<SortSpec<F>>,
    /// Rows to skip
    pub offset: usize,
    /// Rows to take after skipping
    pub limit: Option<usize>,
}

/// Execution strategy for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan<F> {
    /// One native index scan
    Native(NativePlan<F>),
    /// Full materialization and in-memory evaluation
    InMemory {
        /// The validated query to evaluate
        query: Query<F>,
        /// Why the native path was not used
        reason: FallbackReason,
    },
}

impl<F> QueryPlan<F> {
    /// Whether this plan uses the native path
    pub fn is_native(&self) -> bool {
        matches!(self, QueryPlan::Native(_))
    }
}

/// First capability rule the query violates, if any
pub fn fallback_reason<F: RecordField>(query: &Query<F>) -> Option<FallbackReason> {
    if query.sort.len() > 1 {
        return Some(FallbackReason::MultipleSorts);
    }
    if query.filters.len() > 1 {
        return Some(FallbackReason::MultipleFilters);
    }
    if let (Some(filter), Some(sort)) = (query.filters.first(), query.sort.first()) {
        if filter.field != sort.field {
            return Some(FallbackReason::MixedFields);
        }
    }
    if query
        .filters
        .iter()
        .any(|f| f.kind == FilterKind::Contains)
    {
        return Some(FallbackReason::ContainsFilter);
    }
    None
}

fn check_shape<F: RecordField>(query: &Query<F>) -> Result<()> {
    if query.sort.len() > 1 && query.is_sliced() && !query.is_primary_key_lookup() {
        return Err(Error::unsupported_shape(format!(
            "offset/limit with a {}-field sort needs a primary key equality filter",
            query.sort.len()
        )));
    }
    Ok(())
}

/// Validate `query` and choose how to execute it
pub fn plan<F: RecordField>(query: &Query<F>) -> Result<QueryPlan<F>> {
    query.validate()?;
    check_shape(query)?;

    if let Some(reason) = fallback_reason(query) {
        return Ok(QueryPlan::InMemory {
            query: query.clone(),
            reason,
        });
    }

    let scan = match query.filters.first() {
        Some(filter) => {
            // CONTAINS was excluded by fallback_reason
            let range = IndexRange::from_filter(filter.kind, filter.value.clone())
                .ok_or_else(|| Error::unsupported_shape("CONTAINS has no native index"))?;
            Some((filter.field, range))
        }
        None => None,
    };

    Ok(QueryPlan::Native(NativePlan {
        scan,
        order: query.sort.first().copied(),
        offset: query.effective_offset(),
        limit: query.effective_limit(),
    }))
}

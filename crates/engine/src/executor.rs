//! Plan execution against a table state
//!
//! Both paths produce the same rows in the same order for any query they
//! both accept:
//! - native scans yield ties in primary-key order in either direction
//! - a native filter without a sort yields storage order
//! - the evaluator stable-sorts rows taken in storage order

use crate::evaluator;
use crate::planner::{self, NativePlan, QueryPlan};
use meshstore_core::{Query, Record, Result};
use meshstore_storage::{IndexRange, TableState};
use tracing::debug;

/// Run a native plan, borrowing rows from `state`
fn run_native<'a, R: Record>(state: &'a TableState<R>, plan: &NativePlan<R::Field>) -> Vec<&'a R> {
    let rows: Vec<&R> = match (&plan.scan, &plan.order) {
        (Some((field, range)), Some(order)) => {
            debug_assert_eq!(*field, order.field);
            state.index_scan(*field, range, order.direction)
        }
        (Some((field, range)), None) => state.index_filter(*field, range),
        (None, Some(order)) => state.index_scan(order.field, &IndexRange::All, order.direction),
        (None, None) => state.rows().collect(),
    };

    let iter = rows.into_iter().skip(plan.offset);
    match plan.limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

/// Borrowing form of [`execute`]
pub fn execute_ref<'a, R: Record>(
    state: &'a TableState<R>,
    query: &Query<R::Field>,
) -> Result<Vec<&'a R>> {
    let plan = planner::plan(query)?;
    let rows = match &plan {
        QueryPlan::Native(native) => {
            debug!(
                collection = R::COLLECTION,
                indexed = native.scan.is_some() || native.order.is_some(),
                "native query"
            );
            run_native(state, native)
        }
        QueryPlan::InMemory { query, reason } => {
            debug!(
                collection = R::COLLECTION,
                reason = %reason,
                rows = state.len(),
                "in-memory query"
            );
            evaluator::evaluate(state.rows(), query)
        }
    };
    Ok(rows)
}

/// Execute `query` over `state`, cloning the selected rows
pub fn execute<R: Record>(state: &TableState<R>, query: &Query<R::Field>) -> Result<Vec<R>> {
    Ok(execute_ref(state, query)?.into_iter().cloned().collect())
}

/// Execute `query` through the in-memory evaluator regardless of shape
///
/// Validation and the shape check still apply.
pub fn execute_in_memory<R: Record>(
    state: &TableState<R>,
    query: &Query<R::Field>,
) -> Result<Vec<R>> {
    // plan() performs validation and the shape check
    planner::plan(query)?;
    Ok(evaluator::evaluate(state.rows(), query)
        .into_iter()
        .cloned()
        .collect())
}

//! Mini header store
//!
//! Retains only the `max_mini_headers` most recent block headers (by number).
//! Every successful insert is followed, in the same transaction, by eviction of
//! all headers beyond that bound when sorted by number descending.

use meshstore_core::{MiniHeader, MiniHeaderField, Query, Result, SortDirection};
use meshstore_engine::collection::{delete_matching, insert_new};
use meshstore_engine::{mini_header_retention, Database};
use meshstore_storage::TableTransaction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Outcome of [`MiniHeaderStore::add`] and [`MiniHeaderStore::reset`]
///
/// A header inserted and then evicted by the same call appears in both lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddMiniHeadersResult {
    /// Headers that were inserted, in input order
    pub added: Vec<MiniHeader>,
    /// Headers that were removed, in removal order
    pub removed: Vec<MiniHeader>,
}

fn add_with_eviction(
    txn: &mut TableTransaction<'_, MiniHeader>,
    headers: Vec<MiniHeader>,
    max: usize,
    result: &mut AddMiniHeadersResult,
) -> Result<()> {
    let excess = mini_header_retention(max);
    for header in headers {
        if insert_new(txn, &header)? {
            result.added.push(header);
            result.removed.extend(delete_matching(txn, &excess)?);
        }
    }
    Ok(())
}

/// Mini header store primitive
#[derive(Clone)]
pub struct MiniHeaderStore {
    db: Arc<Database>,
}

impl MiniHeaderStore {
    /// Create a new mini header store facade
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn max_mini_headers(&self) -> usize {
        self.db.config().max_mini_headers
    }

    /// Add headers, skipping known hashes and evicting beyond the bound
    pub fn add(&self, headers: Vec<MiniHeader>) -> Result<AddMiniHeadersResult> {
        self.db.ensure_open()?;
        let max = self.max_mini_headers();
        let result = self.db.mini_headers().table().transaction(|txn| {
            let mut result = AddMiniHeadersResult::default();
            add_with_eviction(txn, headers, max, &mut result)?;
            Ok(result)
        })?;
        debug!(
            added = result.added.len(),
            evicted = result.removed.len(),
            max,
            "mini headers added"
        );
        Ok(result)
    }

    /// Replace the whole collection with `headers`
    ///
    /// Clearing and re-adding is one transaction. Every previously stored
    /// header is reported in `removed`, followed by any evictions.
    pub fn reset(&self, headers: Vec<MiniHeader>) -> Result<AddMiniHeadersResult> {
        self.db.ensure_open()?;
        let max = self.max_mini_headers();
        let result = self.db.mini_headers().table().transaction(|txn| {
            let mut result = AddMiniHeadersResult {
                added: Vec::new(),
                removed: txn.clear()?,
            };
            add_with_eviction(txn, headers, max, &mut result)?;
            Ok(result)
        })?;
        debug!(
            added = result.added.len(),
            removed = result.removed.len(),
            "mini headers reset"
        );
        Ok(result)
    }

    /// Get a header by hash, or `NotFound`
    pub fn get(&self, hash: &str) -> Result<MiniHeader> {
        self.db.ensure_open()?;
        self.db.mini_headers().get(&hash.to_string())
    }

    /// Header with the highest block number
    pub fn get_latest(&self) -> Result<Option<MiniHeader>> {
        self.db.ensure_open()?;
        let query = Query::new()
            .sort(MiniHeaderField::Number, SortDirection::Desc)
            .limit(1);
        Ok(self.db.mini_headers().find(&query)?.into_iter().next())
    }

    /// Headers matching `query`
    pub fn find(&self, query: &Query<MiniHeaderField>) -> Result<Vec<MiniHeader>> {
        self.db.ensure_open()?;
        self.db.mini_headers().find(query)
    }

    /// Number of headers `find` would return
    pub fn count(&self, query: &Query<MiniHeaderField>) -> Result<usize> {
        self.db.ensure_open()?;
        self.db.mini_headers().count(query)
    }

    /// Delete a header by hash; `None` if absent
    pub fn delete(&self, hash: &str) -> Result<Option<MiniHeader>> {
        self.db.ensure_open()?;
        self.db.mini_headers().delete(&hash.to_string())
    }

    /// Delete every header matching `query` atomically
    pub fn delete_by_query(&self, query: &Query<MiniHeaderField>) -> Result<Vec<MiniHeader>> {
        self.db.ensure_open()?;
        self.db.mini_headers().delete_by_query(query)
    }

    /// Apply `f` to the stored header and write the result back
    pub fn update<F>(&self, hash: &str, f: F) -> Result<MiniHeader>
    where
        F: FnOnce(MiniHeader) -> MiniHeader,
    {
        self.db.ensure_open()?;
        self.db.mini_headers().update(&hash.to_string(), f)
    }
}

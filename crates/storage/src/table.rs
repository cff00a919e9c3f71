//! Indexed table for one collection
//!
//! # Design
//!
//! - Rows live in a `BTreeMap` keyed by primary key: storage order is key order
//! - Every field (primary key included) has a [`SecondaryIndex`]
//! - One `parking_lot::RwLock` per table: reads share, mutations are exclusive
//!
//! Tables never share locks, so collections do not contend with each other.
//!
//! # Example
//!
//! ```ignore
//! let table: Table<Order> = Table::new();
//! table.transaction(|txn| txn.insert(order))?;
//! let found = table.read(|state| state.get(&hash).cloned());
//! ```

use crate::index::{IndexRange, SecondaryIndex};
use crate::transaction::TableTransaction;
use meshstore_core::{Record, RecordField, Result, SortDirection};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::warn;

/// Rows and indexes of one table
///
/// Obtained through [`Table::read`] or [`TableTransaction::state`]; it is never
/// handed out without a lock held.
#[derive(Debug)]
pub struct TableState<R: Record> {
    rows: BTreeMap<R::Key, R>,
    indexes: FxHashMap<R::Field, SecondaryIndex<R::Key>>,
}

impl<R: Record> TableState<R> {
    fn new() -> Self {
        let indexes = R::Field::all()
            .iter()
            .map(|field| (*field, SecondaryIndex::new()))
            .collect();
        Self {
            rows: BTreeMap::new(),
            indexes,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by primary key
    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.rows.get(key)
    }

    /// Whether a row with this key exists
    pub fn contains(&self, key: &R::Key) -> bool {
        self.rows.contains_key(key)
    }

    /// All rows in storage (primary key) order
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &R> + '_ {
        self.rows.values()
    }

    /// Native ordered scan of `field`'s index
    ///
    /// Rows whose `field` value lies in `range`, ordered by that value in
    /// `direction`. Rows sharing a value are in primary-key order.
    pub fn index_scan(
        &self,
        field: R::Field,
        range: &IndexRange,
        direction: SortDirection,
    ) -> Vec<&R> {
        self.index(field)
            .map(|index| {
                index
                    .scan(range, direction)
                    .into_iter()
                    .filter_map(|key| self.rows.get(key))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Native filtered scan of `field`'s index, in storage order
    pub fn index_filter(&self, field: R::Field, range: &IndexRange) -> Vec<&R> {
        self.index(field)
            .map(|index| {
                index
                    .matching_keys(range)
                    .into_iter()
                    .filter_map(|key| self.rows.get(key))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn index(&self, field: R::Field) -> Option<&SecondaryIndex<R::Key>> {
        let index = self.indexes.get(&field);
        if index.is_none() {
            warn!(collection = R::COLLECTION, field = field.name(), "missing index");
        }
        index
    }

    /// Insert or replace a row, keeping every index in step
    pub(crate) fn put_row(&mut self, row: R) -> Option<R> {
        let key = row.key();
        let previous = self.remove_row(&key);
        for (field, index) in self.indexes.iter_mut() {
            index.insert(row.field(*field), key.clone());
        }
        self.rows.insert(key, row);
        previous
    }

    /// Remove a row, keeping every index in step
    pub(crate) fn remove_row(&mut self, key: &R::Key) -> Option<R> {
        let row = self.rows.remove(key)?;
        for (field, index) in self.indexes.iter_mut() {
            index.remove(&row.field(*field), key);
        }
        Some(row)
    }

    /// Keys of every row, in storage order
    pub(crate) fn keys(&self) -> Vec<R::Key> {
        self.rows.keys().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn index_entries(&self, field: R::Field) -> usize {
        self.indexes.get(&field).map(SecondaryIndex::len).unwrap_or(0)
    }
}

/// Table for one collection
pub struct Table<R: Record> {
    state: RwLock<TableState<R>>,
}

impl<R: Record> Table<R> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TableState::new()),
        }
    }

    /// Create a table pre-populated with `rows`
    ///
    /// Later rows replace earlier ones with the same key.
    pub fn from_rows(rows: impl IntoIterator<Item = R>) -> Self {
        let mut state = TableState::new();
        for row in rows {
            state.put_row(row);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Run `f` under the shared read lock
    pub fn read<T>(&self, f: impl FnOnce(&TableState<R>) -> T) -> T {
        f(&self.state.read())
    }

    /// Clone of the row with this key
    pub fn get(&self, key: &R::Key) -> Option<R> {
        self.state.read().get(key).cloned()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Clone of every row, in storage order
    pub fn rows(&self) -> Vec<R> {
        self.state.read().rows().cloned().collect()
    }

    /// Run `f` as one atomic unit under the exclusive write lock
    ///
    /// Readers are blocked for the duration, so they see either none or all of
    /// the writes. If `f` returns `Err` (or panics), every write it made is
    /// undone before the lock is released and the error is returned unchanged.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TableTransaction<'_, R>) -> Result<T>,
    {
        let mut txn = TableTransaction::new(self.state.write());
        let result = f(&mut txn);
        if result.is_ok() {
            txn.commit();
        }
        result
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> std::fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("collection", &R::COLLECTION)
            .field("rows", &self.len())
            .finish()
    }
}

//! Generic collection operations
//!
//! [`Collection`] is a borrowed view over one [`Table`] carrying the
//! operations every façade shares. Each multi-step mutation is one
//! [`Table::transaction`], so it either fully applies or leaves no trace.

use crate::executor;
use meshstore_core::{Error, Query, Record, Result};
use meshstore_storage::{InsertOutcome, Table, TableTransaction};
use tracing::debug;

/// Operations over one collection's table
pub struct Collection<'a, R: Record> {
    table: &'a Table<R>,
}

impl<'a, R: Record> Collection<'a, R> {
    /// View over `table`
    pub fn new(table: &'a Table<R>) -> Self {
        Self { table }
    }

    /// Underlying table
    pub fn table(&self) -> &'a Table<R> {
        self.table
    }

    /// Row by primary key, or `NotFound`
    pub fn get(&self, key: &R::Key) -> Result<R> {
        self.table
            .get(key)
            .ok_or_else(|| Error::not_found(R::COLLECTION, key))
    }

    /// Rows matching `query`
    pub fn find(&self, query: &Query<R::Field>) -> Result<Vec<R>> {
        self.table.read(|state| executor::execute(state, query))
    }

    /// Number of rows `find` would return
    pub fn count(&self, query: &Query<R::Field>) -> Result<usize> {
        if query.is_empty() {
            return Ok(self.table.len());
        }
        self.table
            .read(|state| executor::execute_ref(state, query).map(|rows| rows.len()))
    }

    /// Insert every new row, skipping keys already present
    ///
    /// Returns the rows actually inserted, in input order.
    pub fn insert_many(&self, rows: Vec<R>) -> Result<Vec<R>> {
        let offered = rows.len();
        let added = self.table.transaction(|txn| {
            let mut added = Vec::with_capacity(rows.len());
            for row in rows {
                if insert_new(txn, &row)? {
                    added.push(row);
                }
            }
            Ok(added)
        })?;
        debug!(
            collection = R::COLLECTION,
            offered,
            added = added.len(),
            "insert_many"
        );
        Ok(added)
    }

    /// Delete by primary key; an absent key yields `None`
    pub fn delete(&self, key: &R::Key) -> Result<Option<R>> {
        self.table.transaction(|txn| txn.delete(key))
    }

    /// Delete every row matching `query`, returning them
    pub fn delete_by_query(&self, query: &Query<R::Field>) -> Result<Vec<R>> {
        let removed = self.table.transaction(|txn| delete_matching(txn, query))?;
        debug!(
            collection = R::COLLECTION,
            removed = removed.len(),
            "delete_by_query"
        );
        Ok(removed)
    }

    /// Read, apply `f`, and write back as one unit
    pub fn update<F>(&self, key: &R::Key, f: F) -> Result<R>
    where
        F: FnOnce(R) -> R,
    {
        self.table.transaction(|txn| update_row(txn, key, f))
    }
}

impl<R: Record> Clone for Collection<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Record> Copy for Collection<'_, R> {}

/// Insert `row` inside `txn`; `false` when the key was already taken
pub fn insert_new<R: Record>(txn: &mut TableTransaction<'_, R>, row: &R) -> Result<bool> {
    match txn.insert(row.clone())? {
        InsertOutcome::Inserted => Ok(true),
        InsertOutcome::AlreadyPresent => Ok(false),
    }
}

/// Delete every row matching `query` inside `txn`
///
/// Rows are returned in the order `query` selects them.
pub fn delete_matching<R: Record>(
    txn: &mut TableTransaction<'_, R>,
    query: &Query<R::Field>,
) -> Result<Vec<R>> {
    let matches = executor::execute(txn.state(), query)?;
    for row in &matches {
        txn.delete(&row.key())?;
    }
    Ok(matches)
}

/// Read, apply `f`, and write back inside `txn`
///
/// Fails with `NotFound` if the row is absent and with `ImmutableKey` if `f`
/// changed the primary key.
pub fn update_row<R, F>(txn: &mut TableTransaction<'_, R>, key: &R::Key, f: F) -> Result<R>
where
    R: Record,
    F: FnOnce(R) -> R,
{
    let existing = txn
        .get(key)
        .ok_or_else(|| Error::not_found(R::COLLECTION, key))?;
    let updated = f(existing);
    if &updated.key() != key {
        return Err(Error::ImmutableKey {
            collection: R::COLLECTION,
            key: key.to_string(),
        });
    }
    txn.put(updated.clone())?;
    Ok(updated)
}

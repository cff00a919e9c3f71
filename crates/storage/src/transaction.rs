//! Undo-log transactions
//!
//! A [`TableTransaction`] holds the table's write guard for its whole life and
//! applies writes in place, recording how to reverse each one. Dropping it
//! without [`commit`](TableTransaction::commit) replays the undo log in reverse,
//! so an `Err` return or a panic inside [`Table::transaction`](crate::Table::transaction)
//! leaves the table exactly as it was.

use crate::table::TableState;
use meshstore_core::{Record, Result};
use parking_lot::RwLockWriteGuard;
use tracing::{trace, warn};

/// Outcome of an insert that must not overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row was added
    Inserted,
    /// A row with the same key exists; nothing was written
    AlreadyPresent,
}

enum UndoEntry<R: Record> {
    /// Undo an insert of a fresh key
    Remove(R::Key),
    /// Undo a replace or delete
    Restore(R),
}

/// Exclusive, atomic scope over one table
pub struct TableTransaction<'a, R: Record> {
    state: RwLockWriteGuard<'a, TableState<R>>,
    undo: Vec<UndoEntry<R>>,
    committed: bool,
}

impl<'a, R: Record> TableTransaction<'a, R> {
    pub(crate) fn new(state: RwLockWriteGuard<'a, TableState<R>>) -> Self {
        Self {
            state,
            undo: Vec::new(),
            committed: false,
        }
    }

    /// Current state, including this transaction's own writes
    pub fn state(&self) -> &TableState<R> {
        &self.state
    }

    /// Clone of the row with this key
    pub fn get(&self, key: &R::Key) -> Option<R> {
        self.state.get(key).cloned()
    }

    /// Insert `row` unless its key is taken
    pub fn insert(&mut self, row: R) -> Result<InsertOutcome> {
        let key = row.key();
        if self.state.contains(&key) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        self.state.put_row(row);
        self.undo.push(UndoEntry::Remove(key));
        Ok(InsertOutcome::Inserted)
    }

    /// Insert or replace `row`, returning the replaced row
    pub fn put(&mut self, row: R) -> Result<Option<R>> {
        let key = row.key();
        let previous = self.state.put_row(row);
        match &previous {
            Some(old) => self.undo.push(UndoEntry::Restore(old.clone())),
            None => self.undo.push(UndoEntry::Remove(key)),
        }
        Ok(previous)
    }

    /// Delete the row with this key, returning it
    pub fn delete(&mut self, key: &R::Key) -> Result<Option<R>> {
        let removed = self.state.remove_row(key);
        if let Some(row) = &removed {
            self.undo.push(UndoEntry::Restore(row.clone()));
        }
        Ok(removed)
    }

    /// Delete every row, returning them in storage order
    pub fn clear(&mut self) -> Result<Vec<R>> {
        let mut removed = Vec::with_capacity(self.state.len());
        for key in self.state.keys() {
            if let Some(row) = self.delete(&key)? {
                removed.push(row);
            }
        }
        Ok(removed)
    }

    /// Number of writes applied so far
    pub fn write_count(&self) -> usize {
        self.undo.len()
    }

    pub(crate) fn commit(mut self) {
        trace!(collection = R::COLLECTION, writes = self.undo.len(), "commit");
        self.committed = true;
        self.undo.clear();
    }

    fn rollback(&mut self) {
        warn!(
            collection = R::COLLECTION,
            writes = self.undo.len(),
            "rolling back transaction"
        );
        while let Some(entry) = self.undo.pop() {
            match entry {
                UndoEntry::Remove(key) => {
                    self.state.remove_row(&key);
                }
                UndoEntry::Restore(row) => {
                    self.state.put_row(row);
                }
            }
        }
    }
}

impl<R: Record> Drop for TableTransaction<'_, R> {
    fn drop(&mut self) {
        if !self.committed && !self.undo.is_empty() {
            self.rollback();
        }
    }
}

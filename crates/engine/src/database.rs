//! Database handle
//!
//! Owns the three collection tables. There is no global registry: callers
//! open a [`Database`], share the returned `Arc`, and close it explicitly.
//!
//! # Persistence
//!
//! With `data_path` set, [`Database::open`] loads the snapshot found there (if
//! any) and [`Database::flush`] writes a fresh one. Without it the database is
//! purely in-memory and `flush` is a no-op.

use crate::collection::{delete_matching, Collection};
use crate::config::StoreConfig;
use meshstore_core::{
    Error, Metadata, MiniHeader, MiniHeaderField, Order, Query, Result, SortDirection,
};
use meshstore_durability::{read_snapshot, write_snapshot, Snapshot};
use meshstore_storage::Table;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Mini headers beyond the newest `max` by block number
pub fn mini_header_retention(max: usize) -> Query<MiniHeaderField> {
    Query::new()
        .sort(MiniHeaderField::Number, SortDirection::Desc)
        .offset(max)
}

/// Embedded store for orders, mini headers and metadata
pub struct Database {
    config: StoreConfig,
    orders: Table<Order>,
    mini_headers: Table<MiniHeader>,
    metadata: Table<Metadata>,
    open: AtomicBool,
    /// Serializes snapshot writers
    flush_lock: Mutex<()>,
}

impl Database {
    /// Open a database with `config`
    ///
    /// Validates the configuration and, when `data_path` is set, loads the
    /// snapshot stored there.
    pub fn open(config: StoreConfig) -> Result<Arc<Self>> {
        config.validate()?;

        let snapshot = match config.snapshot_path() {
            Some(path) => read_snapshot(&path)?.unwrap_or_default(),
            None => Snapshot::default(),
        };
        let rows = snapshot.row_count();

        let db = Self {
            orders: Table::from_rows(snapshot.orders),
            mini_headers: Table::from_rows(snapshot.mini_headers),
            metadata: Table::from_rows(snapshot.metadata),
            config,
            open: AtomicBool::new(true),
            flush_lock: Mutex::new(()),
        };

        let evicted = db.enforce_retention()?;
        if !evicted.is_empty() {
            info!(
                evicted = evicted.len(),
                max_mini_headers = db.config.max_mini_headers,
                "evicted mini headers beyond retention on open"
            );
        }

        info!(
            data_path = ?db.config.data_path,
            rows,
            max_mini_headers = db.config.max_mini_headers,
            "database opened"
        );
        Ok(Arc::new(db))
    }

    /// Drop stored mini headers beyond `max_mini_headers`, in one transaction
    fn enforce_retention(&self) -> Result<Vec<MiniHeader>> {
        let excess = mini_header_retention(self.config.max_mini_headers);
        self.mini_headers.transaction(|txn| delete_matching(txn, &excess))
    }

    /// Open a purely in-memory database with default settings
    pub fn in_memory() -> Result<Arc<Self>> {
        Self::open(StoreConfig::default())
    }

    /// Configuration this database was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether the database still accepts operations
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// `DatabaseClosed` once [`close`](Self::close) has run
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::DatabaseClosed)
        }
    }

    /// Order collection
    pub fn orders(&self) -> Collection<'_, Order> {
        Collection::new(&self.orders)
    }

    /// Mini header collection
    pub fn mini_headers(&self) -> Collection<'_, MiniHeader> {
        Collection::new(&self.mini_headers)
    }

    /// Metadata collection
    pub fn metadata(&self) -> Collection<'_, Metadata> {
        Collection::new(&self.metadata)
    }

    /// Copy of every collection
    ///
    /// Each table is read under its own lock; there is no cross-collection
    /// consistency.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            orders: self.orders.rows(),
            mini_headers: self.mini_headers.rows(),
            metadata: self.metadata.rows(),
        }
    }

    /// Write a snapshot to `data_path`
    ///
    /// No-op for in-memory databases.
    pub fn flush(&self) -> Result<()> {
        self.ensure_open()?;
        self.write_snapshot()
    }

    fn write_snapshot(&self) -> Result<()> {
        let Some(path) = self.config.snapshot_path() else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock();
        write_snapshot(&path, &self.snapshot())
    }

    /// Stop accepting operations, flushing first if configured
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if self.config.flush_on_close {
            self.write_snapshot()?;
        }
        info!(data_path = ?self.config.data_path, "database closed");
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                warn!(error = %e, "failed to close database on drop");
            }
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .field("orders", &self.orders)
            .field("mini_headers", &self.mini_headers)
            .field("metadata", &self.metadata)
            .finish()
    }
}

//! Embedded store for a peer-to-peer order relay node
//!
//! Persists trading orders, a bounded window of recent block headers, and a
//! singleton metadata row, with structured queries that run on a native index
//! scan when their shape allows and fall back to in-memory evaluation
//! otherwise.
//!
//! # Example
//!
//! ```ignore
//! use meshstore::{MeshStore, StoreConfig, Query, OrderField, FilterKind};
//!
//! let store = MeshStore::open(StoreConfig::new().data_path("/var/lib/mesh"))?;
//! store.orders.add(vec![order])?;
//! let live = store.orders.find(
//!     &Query::new().filter(OrderField::IsRemoved, FilterKind::Equal, false),
//! )?;
//! store.close()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;

pub use meshstore_engine::Database;
pub use meshstore_primitives::{MetadataStore, MiniHeaderStore, OrderStore};
pub use types::*;

use std::sync::Arc;
use tracing::info;

/// An open database with its three collection stores
#[derive(Clone)]
pub struct MeshStore {
    db: Arc<Database>,
    /// Orders keyed by hash
    pub orders: OrderStore,
    /// Recent block headers keyed by hash
    pub mini_headers: MiniHeaderStore,
    /// Singleton metadata row
    pub metadata: MetadataStore,
}

impl MeshStore {
    /// Open a database with `config` and build the stores over it
    pub fn open(config: StoreConfig) -> Result<Self> {
        let db = Database::open(config)?;
        info!(
            orders = db.orders().table().len(),
            mini_headers = db.mini_headers().table().len(),
            "mesh store ready"
        );
        Ok(Self::with_database(db))
    }

    /// Build the stores over an already open database
    pub fn with_database(db: Arc<Database>) -> Self {
        Self {
            orders: OrderStore::new(db.clone()),
            mini_headers: MiniHeaderStore::new(db.clone()),
            metadata: MetadataStore::new(db.clone()),
            db,
        }
    }

    /// Underlying database handle
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Write a snapshot now
    pub fn flush(&self) -> Result<()> {
        self.db.flush()
    }

    /// Close the database, flushing if configured
    pub fn close(&self) -> Result<()> {
        self.db.close()
    }
}

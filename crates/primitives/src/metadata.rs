//! Metadata store
//!
//! Holds at most one row. The first [`save`](MetadataStore::save) creates it;
//! every later change goes through [`update`](MetadataStore::update).

use meshstore_core::{Error, Metadata, Record, Result};
use meshstore_engine::collection::update_row;
use meshstore_engine::Database;
use std::sync::Arc;
use tracing::info;

/// Key reported when no metadata row exists
const SINGLETON_KEY: &str = "singleton";

/// Metadata store primitive
#[derive(Clone)]
pub struct MetadataStore {
    db: Arc<Database>,
}

impl MetadataStore {
    /// Create a new metadata store facade
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The metadata row, or `NotFound`
    pub fn get(&self) -> Result<Metadata> {
        self.db.ensure_open()?;
        self.db
            .metadata()
            .table()
            .read(|state| state.rows().next().cloned())
            .ok_or_else(|| Error::not_found(Metadata::COLLECTION, SINGLETON_KEY))
    }

    /// Store the metadata row
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if a row is already present, whatever its chain id
    pub fn save(&self, metadata: Metadata) -> Result<()> {
        self.db.ensure_open()?;
        let chain_id = metadata.ethereum_chain_id;
        self.db.metadata().table().transaction(|txn| {
            if let Some(existing) = txn.state().rows().next() {
                return Err(Error::AlreadyExists {
                    collection: Metadata::COLLECTION,
                    key: existing.key().to_string(),
                });
            }
            txn.insert(metadata)?;
            Ok(())
        })?;
        info!(chain_id, "metadata saved");
        Ok(())
    }

    /// Apply `f` to the metadata row and write the result back
    ///
    /// # Errors
    ///
    /// - `NotFound` if no row exists
    /// - `ImmutableKey` if `f` changes the chain id
    pub fn update<F>(&self, f: F) -> Result<Metadata>
    where
        F: FnOnce(Metadata) -> Metadata,
    {
        self.db.ensure_open()?;
        self.db.metadata().table().transaction(|txn| {
            let key = txn
                .state()
                .rows()
                .next()
                .map(|m| m.key())
                .ok_or_else(|| Error::not_found(Metadata::COLLECTION, SINGLETON_KEY))?;
            update_row(txn, &key, f)
        })
    }
}

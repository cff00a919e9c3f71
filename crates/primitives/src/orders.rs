//! Order store
//!
//! Stateless facade over the order table of a [`Database`].
//!
//! # Design
//!
//! OrderStore holds only an `Arc<Database>`. Multiple instances sharing the
//! same Database see the same data, and Clone is cheap (just an Arc clone).
//! Orders are never expired here: removal is always explicit, by hash or by
//! query.
//!
//! # Example
//!
//! ```ignore
//! let db = Database::in_memory()?;
//! let orders = OrderStore::new(db.clone());
//!
//! let result = orders.add(vec![order])?;
//! let open = orders.find(
//!     &Query::new().filter(OrderField::IsRemoved, FilterKind::Equal, false),
//! )?;
//! ```

use meshstore_core::{Order, OrderField, OrderStatus, Query, Result};
use meshstore_engine::Database;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Outcome of [`OrderStore::add`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOrdersResult {
    /// Orders that were inserted; duplicates are left out
    pub added: Vec<Order>,
}

/// Order store primitive
///
/// # Thread Safety
///
/// OrderStore is Clone and Send + Sync. Every mutation runs under the order
/// table's write lock, so concurrent callers are serialized.
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
}

impl OrderStore {
    /// Create a new order store facade
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Add orders, skipping hashes that are already stored
    ///
    /// The whole batch is one atomic write. A hash repeated within the batch
    /// is added once, from its first occurrence.
    ///
    /// # Returns
    ///
    /// The orders actually inserted, in input order
    pub fn add(&self, orders: Vec<Order>) -> Result<AddOrdersResult> {
        self.db.ensure_open()?;
        let added = self.db.orders().insert_many(orders)?;
        Ok(AddOrdersResult { added })
    }

    /// Get an order by hash
    ///
    /// # Errors
    ///
    /// `NotFound` if no order has this hash
    pub fn get(&self, hash: &str) -> Result<Order> {
        self.db.ensure_open()?;
        self.db.orders().get(&hash.to_string())
    }

    /// Orders matching `query`
    pub fn find(&self, query: &Query<OrderField>) -> Result<Vec<Order>> {
        self.db.ensure_open()?;
        self.db.orders().find(query)
    }

    /// Number of orders `find` would return for `query`
    pub fn count(&self, query: &Query<OrderField>) -> Result<usize> {
        self.db.ensure_open()?;
        self.db.orders().count(query)
    }

    /// Delete an order by hash
    ///
    /// # Returns
    ///
    /// The deleted order, or `None` if the hash was not stored
    pub fn delete(&self, hash: &str) -> Result<Option<Order>> {
        self.db.ensure_open()?;
        self.db.orders().delete(&hash.to_string())
    }

    /// Delete every order matching `query`
    ///
    /// Evaluation and deletion happen in one transaction: either all matches
    /// are removed or none are.
    pub fn delete_by_query(&self, query: &Query<OrderField>) -> Result<Vec<Order>> {
        self.db.ensure_open()?;
        self.db.orders().delete_by_query(query)
    }

    /// Apply `f` to the stored order and write the result back
    ///
    /// # Errors
    ///
    /// - `NotFound` if no order has this hash
    /// - `ImmutableKey` if `f` changes the hash
    pub fn update<F>(&self, hash: &str, f: F) -> Result<Order>
    where
        F: FnOnce(Order) -> Order,
    {
        self.db.ensure_open()?;
        self.db.orders().update(&hash.to_string(), f)
    }

    /// Storage status of each requested hash
    ///
    /// All hashes are looked up under one read lock, so the answers are
    /// mutually consistent.
    pub fn statuses(&self, hashes: &[String]) -> Result<Vec<OrderStatus>> {
        self.db.ensure_open()?;
        let statuses = self.db.orders().table().read(|state| {
            hashes
                .iter()
                .map(|hash| match state.get(hash) {
                    Some(order) => OrderStatus {
                        hash: hash.clone(),
                        is_stored: true,
                        is_marked_removed: order.is_removed,
                        fillable_taker_asset_amount: order.fillable_taker_asset_amount.clone(),
                    },
                    None => OrderStatus {
                        hash: hash.clone(),
                        is_stored: false,
                        is_marked_removed: false,
                        fillable_taker_asset_amount: "0".to_string(),
                    },
                })
                .collect::<Vec<_>>()
        });
        debug!(requested = hashes.len(), "order statuses");
        Ok(statuses)
    }
}

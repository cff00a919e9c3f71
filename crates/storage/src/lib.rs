//! Record store for meshstore
//!
//! One [`Table`] per collection. Each table keeps its rows in primary-key order
//! and an ordered index on every field, and exposes:
//! - Lock-scoped reads via [`Table::read`] returning a [`TableState`] view
//! - Native index scans ([`TableState::index_scan`], [`TableState::index_filter`])
//! - Atomic multi-step writes via [`Table::transaction`]
//!
//! Inserting an existing key is reported as [`InsertOutcome::AlreadyPresent`],
//! never as an error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod table;
pub mod transaction;

pub use index::{IndexRange, SecondaryIndex};
pub use table::{Table, TableState};
pub use transaction::{InsertOutcome, TableTransaction};

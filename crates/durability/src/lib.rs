//! Durability layer for meshstore
//!
//! The store is memory-resident; durability is a whole-state snapshot written
//! on flush and read back on open. See [`snapshot`] for the file format.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;

pub use snapshot::{read_snapshot, write_snapshot, Snapshot, SNAPSHOT_FILE_NAME};

//! Query engine and database handle for meshstore
//!
//! - [`planner`]: chooses the native index path or the in-memory fallback
//! - [`evaluator`]: reference in-memory semantics (filter, stable sort, slice)
//! - [`executor`]: runs a plan against a locked table state
//! - [`Collection`]: shared get/find/count/delete/update operations
//! - [`Database`]: owns the tables, loads and writes snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod database;
pub mod evaluator;
pub mod executor;
pub mod planner;

pub use collection::Collection;
pub use config::{StoreConfig, DEFAULT_MAX_MINI_HEADERS};
pub use database::{mini_header_retention, Database};
pub use executor::{execute, execute_in_memory};
pub use planner::{plan, FallbackReason, NativePlan, QueryPlan};

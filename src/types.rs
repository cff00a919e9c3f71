//! Public types for the meshstore API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// ============================================================================
// Records
// ============================================================================

pub use meshstore_core::{Metadata, MiniHeader, Order, OrderStatus};

// ============================================================================
// Query model
// ============================================================================

pub use meshstore_core::{
    FieldKind, FieldValue, Filter, FilterKind, MetadataField, MiniHeaderField, OrderField, Query,
    SortDirection, SortSpec,
};

// ============================================================================
// Results and errors
// ============================================================================

pub use meshstore_core::{Error, Result};
pub use meshstore_primitives::{AddMiniHeadersResult, AddOrdersResult};

// Configuration
pub use meshstore_engine::StoreConfig;

//! Collection stores for meshstore
//!
//! Three stateless facades over a shared [`Database`](meshstore_engine::Database):
//! - [`OrderStore`]: orders keyed by hash, duplicate-skipping bulk add
//! - [`MiniHeaderStore`]: block headers with bounded retention
//! - [`MetadataStore`]: the singleton metadata row
//!
//! Each facade holds only an `Arc<Database>` and is cheap to clone.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod metadata;
pub mod mini_headers;
pub mod orders;

pub use metadata::MetadataStore;
pub use mini_headers::{AddMiniHeadersResult, MiniHeaderStore};
pub use orders::{AddOrdersResult, OrderStore};

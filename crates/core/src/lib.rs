//! Core types for meshstore
//!
//! This crate defines the vocabulary shared by every layer:
//! - Records: [`Order`], [`MiniHeader`], [`Metadata`] and their field enums
//! - Field values: [`FieldValue`], [`FieldKind`], the [`Record`]/[`RecordField`] traits
//! - Query model: [`Query`], [`Filter`], [`FilterKind`], [`SortSpec`], [`SortDirection`]
//! - Errors: [`Error`] and the [`Result`] alias

#![warn(clippy::all)]

pub mod error;
pub mod query;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use query::{Filter, FilterKind, Query, SortDirection, SortSpec};
pub use types::{
    Metadata, MetadataField, MiniHeader, MiniHeaderField, Order, OrderField, OrderStatus,
};
pub use value::{FieldKind, FieldValue, Record, RecordField};

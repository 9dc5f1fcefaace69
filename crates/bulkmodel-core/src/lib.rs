//! Core types and traits for BulkModel.
//!
//! This crate provides the foundational abstractions for bulk upserts:
//!
//! - `Entity` trait for handing domain objects to a bulk session
//! - `TableMetadata` and `ColumnMetadata` for the target table
//! - `IdGenerator` for client-side identifier generation
//! - `Connection` trait for the database driver
//! - `Outcome` re-export from asupersync for cancel-correct operations
//! - `Cx` context for structured concurrency

#![allow(clippy::result_large_err)] // Error carries query context by value

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Budget, Cx, Outcome, RegionId, TaskId};

pub mod connection;
pub mod dialect;
pub mod error;
pub mod field;
pub mod generator;
pub mod metadata;
pub mod model;
pub mod row;
pub mod types;
pub mod value;

pub use connection::{Connection, PreparedStatement};
pub use dialect::Dialect;
pub use error::{
    BulkError, BulkErrorKind, ConnectionError, ConnectionErrorKind, Error, QueryError,
    QueryErrorKind, Result, SchemaError, SchemaErrorKind, TypeError,
};
pub use field::{ColumnMetadata, JoinColumn};
pub use generator::{GeneratorStrategy, HASHED_ID_LEN, HashedIdGenerator, IdGenerator, simple_hash};
pub use metadata::{LifecycleEvent, TableMetadata};
pub use model::{Entity, EntityMetadata, EntityState, FieldValue, ModelState};
pub use row::PendingRow;
pub use types::SqlType;
pub use value::Value;

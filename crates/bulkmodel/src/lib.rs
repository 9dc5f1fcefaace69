//! BulkModel Rust - batched multi-row upserts with schema-derived validation.
//!
//! BulkModel persists large numbers of records without one statement per
//! record:
//!
//! - Rows are queued as raw field maps or as domain objects
//! - Each row is checked against the table's column metadata when queued
//! - Missing identifiers come from a pluggable generator
//! - Queued rows are optionally de-duplicated, chunked, and written with one
//!   multi-row `INSERT ... ON DUPLICATE KEY UPDATE` (or `ON CONFLICT`) per chunk
//!
//! # Quick Start
//!
//! ```ignore
//! use bulkmodel::prelude::*;
//!
//! let metadata = TableMetadata::new("Author")
//!     .table("authors")
//!     .column(ColumnMetadata::new("id", "id", SqlType::Char(25)).nullable(true))
//!     .column(ColumnMetadata::new("fullName", "full_name", SqlType::VarChar(255)))
//!     .column(ColumnMetadata::new("otherData", "other_data", SqlType::Text))
//!     .id_fields(["id"])
//!     .hashed_id_fields(["fullName", "otherData"])
//!     .generator_strategy(GeneratorStrategy::Hashed)?;
//!
//! async fn import(cx: &Cx, conn: &impl Connection, metadata: TableMetadata) {
//!     let mut bulk = BulkUpsert::new(conn, metadata);
//!     bulk.add_value(
//!         PendingRow::new()
//!             .with("fullName", "Jane Doe")
//!             .with("otherData", "imported"),
//!     )
//!     .unwrap();
//!
//!     bulk.execute_with(cx, UpsertOptions::new().ignore_duplicates(true))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! # Features
//!
//! - **No reflection**: domain types implement the small `Entity` accessor trait
//! - **Structured concurrency**: Built on asupersync for cancel-correct operations
//! - **Deterministic ids**: `HashedIdGenerator` derives stable surrogate keys
//! - **Dialect aware**: MySQL, PostgreSQL and SQLite upsert syntax

// Re-export all public types from sub-crates
pub use bulkmodel_core::{
    // asupersync re-exports
    Budget,
    // Errors
    BulkError,
    BulkErrorKind,
    // Metadata
    ColumnMetadata,
    // Driver contract
    Connection,
    ConnectionError,
    ConnectionErrorKind,
    Cx,
    Dialect,
    // Entities
    Entity,
    EntityMetadata,
    EntityState,
    Error,
    FieldValue,
    // Identifier generation
    GeneratorStrategy,
    HashedIdGenerator,
    IdGenerator,
    JoinColumn,
    LifecycleEvent,
    ModelState,
    Outcome,
    PendingRow,
    PreparedStatement,
    QueryError,
    QueryErrorKind,
    RegionId,
    Result,
    SchemaError,
    SchemaErrorKind,
    SqlType,
    TableMetadata,
    TaskId,
    TypeError,
    Value,
    simple_hash,
};

pub use bulkmodel_query::{UpsertBuilder, raw_execute, upsert};

pub use bulkmodel_session::{
    BulkUpsert, DEFAULT_MAX_ROWS, FlushResult, UpsertExecutor, UpsertOptions,
};

/// Everything needed to define tables and run bulk sessions.
pub mod prelude {
    pub use crate::{
        // asupersync
        Budget,
        // Sessions
        BulkUpsert,
        // Metadata
        ColumnMetadata,
        // Driver
        Connection,
        Cx,
        Dialect,
        // Entities
        Entity,
        EntityMetadata,
        EntityState,
        Error,
        FieldValue,
        GeneratorStrategy,
        HashedIdGenerator,
        IdGenerator,
        LifecycleEvent,
        Outcome,
        PendingRow,
        RegionId,
        Result,
        SqlType,
        TableMetadata,
        TaskId,
        UpsertOptions,
        Value,
        // Macros
        upsert,
    };
}

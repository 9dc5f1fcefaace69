//! Database connection trait.
//!
//! Bulk sessions need only a narrow slice of a driver: prepare a statement,
//! execute it with positional parameters, and report the last inserted id.
//!
//! All operations integrate with asupersync's structured concurrency via `Cx` context
//! for proper cancellation and timeout handling.

use crate::dialect::Dialect;
use crate::types::SqlType;
use crate::value::Value;
use asupersync::{Cx, Outcome};

/// A prepared statement for repeated execution.
///
/// Parameters are handled separately from the SQL text. Each parameter can
/// carry a type hint taken from the column it binds to; drivers that bind
/// typed values use it, others ignore it.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    /// Unique identifier for this prepared statement (driver-specific)
    id: u64,
    /// The original SQL text
    sql: String,
    /// Number of expected parameters
    param_count: usize,
    /// Per-parameter type hints, empty when unknown
    param_types: Vec<SqlType>,
}

impl PreparedStatement {
    /// Create a new prepared statement.
    ///
    /// This is typically called by the driver, not by users directly.
    #[must_use]
    pub fn new(id: u64, sql: String, param_count: usize) -> Self {
        Self {
            id,
            sql,
            param_count,
            param_types: Vec::new(),
        }
    }

    /// Attach positional type hints.
    #[must_use]
    pub fn with_param_types(mut self, types: Vec<SqlType>) -> Self {
        self.param_types = types;
        self
    }

    /// Get the statement ID.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Get the original SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the expected number of parameters.
    #[must_use]
    pub const fn param_count(&self) -> usize {
        self.param_count
    }

    /// Type hint of the parameter at `index` (0-based).
    #[must_use]
    pub fn param_type(&self, index: usize) -> Option<&SqlType> {
        self.param_types.get(index)
    }

    /// All type hints.
    #[must_use]
    pub fn param_types(&self) -> &[SqlType] {
        &self.param_types
    }

    /// Check if the provided parameters match the expected count.
    #[must_use]
    pub fn validate_params(&self, params: &[Value]) -> bool {
        params.len() == self.param_count
    }
}

/// A database connection a bulk session writes through.
///
/// All operations are async and take a `Cx` context for cancellation/timeout support.
/// Implementations must be `Send + Sync` for use across async boundaries.
///
/// # Example
///
/// ```rust,ignore
/// let stmt = conn.prepare(&cx, "INSERT INTO tags (name) VALUES (?), (?)").await?;
/// conn.execute_prepared(&cx, &stmt, &[Value::from("a"), Value::from("b")]).await?;
/// let id = conn.last_insert_id(&cx).await?;
/// ```
pub trait Connection: Send + Sync {
    /// SQL dialect used to render statements for this connection.
    fn dialect(&self) -> Dialect;

    /// Escape an identifier (table or column name).
    fn quote_identifier(&self, name: &str) -> String {
        self.dialect().quote_identifier(name)
    }

    /// Prepare a statement.
    fn prepare(
        &self,
        cx: &Cx,
        sql: &str,
    ) -> impl Future<Output = Outcome<PreparedStatement, crate::Error>> + Send;

    /// Execute a prepared statement (INSERT, UPDATE, DELETE) and return rows affected.
    fn execute_prepared(
        &self,
        cx: &Cx,
        stmt: &PreparedStatement,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, crate::Error>> + Send;

    /// Identifier the database assigned to the most recent insert.
    ///
    /// `Value::Null` when the driver cannot tell.
    fn last_insert_id(&self, cx: &Cx) -> impl Future<Output = Outcome<Value, crate::Error>> + Send;
}

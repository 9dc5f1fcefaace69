//! Upsert statement rendering for BulkModel.
//!
//! `bulkmodel-query` is the **statement construction layer**. It turns a column
//! list and a set of value tuples into one parametrized multi-row upsert for
//! the connection's dialect.
//!
//! - **MySQL**: `INSERT ... ON DUPLICATE KEY UPDATE c=VALUES(c)`.
//! - **Postgres / SQLite**: `INSERT ... ON CONFLICT (ids) DO UPDATE SET c=excluded.c`.
//!
//! The resulting statements execute through the `Connection` trait from
//! `bulkmodel-core`. Most users never touch this crate directly; bulk sessions
//! in `bulkmodel-session` drive it.

#![allow(clippy::result_large_err)] // Error type is defined in bulkmodel-core

pub mod builder;

pub use builder::UpsertBuilder;

use asupersync::{Cx, Outcome};
use bulkmodel_core::{Connection, Value};

/// Create an upsert builder for a table.
///
/// # Example
///
/// ```ignore
/// let affected = upsert!("tags")
///     .column("name", SqlType::VarChar(64))
///     .row(vec![Value::from("rust")])
///     .execute(cx, &conn)
///     .await?;
/// ```
#[macro_export]
macro_rules! upsert {
    ($table:expr) => {
        $crate::builder::UpsertBuilder::new($table)
    };
}

/// Raw SQL statement execution.
///
/// For statements the upsert builder can't express.
pub async fn raw_execute<C: Connection>(
    cx: &Cx,
    conn: &C,
    sql: &str,
    params: &[Value],
) -> Outcome<u64, bulkmodel_core::Error> {
    let stmt = match conn.prepare(cx, sql).await {
        Outcome::Ok(stmt) => stmt,
        Outcome::Err(e) => return Outcome::Err(e),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };
    conn.execute_prepared(cx, &stmt, params).await
}

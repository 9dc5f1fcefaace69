//! Writing queued rows to the database, one multi-row upsert per chunk.
//!
//! For every chunk the executor:
//! - computes the field superset (first-seen union of the chunk's fields)
//! - maps fields to column names and renders one upsert statement
//! - binds values row-major, regenerating identifiers when a generator is set
//! - executes, then asks the driver for the last inserted id when relevant
//!
//! Chunks run strictly in order, one round trip each.

use crate::plan;
use asupersync::{Cx, Outcome};
use bulkmodel_core::{BulkError, Connection, Error, PendingRow, Result, TableMetadata, Value};
use bulkmodel_query::UpsertBuilder;

/// Field names used by any row of `chunk`, in first-seen order.
pub fn field_superset(chunk: &[PendingRow]) -> Vec<&str> {
    let mut fields: Vec<&str> = Vec::new();
    for row in chunk {
        for field in row.fields() {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
    }
    fields
}

/// Executes chunks of rows for one table.
#[derive(Debug, Clone, Copy)]
pub struct UpsertExecutor<'m> {
    metadata: &'m TableMetadata,
    suppress_return_id: bool,
}

impl<'m> UpsertExecutor<'m> {
    /// Create an executor for `metadata`'s table.
    pub fn new(metadata: &'m TableMetadata, suppress_return_id: bool) -> Self {
        Self {
            metadata,
            suppress_return_id,
        }
    }

    /// Whether a chunk reports the driver's last inserted id.
    ///
    /// A configured generator means identifiers are client-supplied, so
    /// there is nothing the database assigned.
    pub fn returns_id(&self) -> bool {
        !self.suppress_return_id && self.metadata.id_generator().is_none()
    }

    /// Render the statement and bind the values for one chunk.
    pub fn build(&self, chunk: &[PendingRow]) -> Result<UpsertBuilder> {
        let meta = self.metadata;
        let fields = field_superset(chunk);

        let mut columns = Vec::with_capacity(fields.len());
        for field in &fields {
            let Some(column) = meta.field(field) else {
                return Err(BulkError::field_not_found(meta.entity(), *field).into());
            };
            columns.push(column);
        }

        let Some(table) = meta.table_name() else {
            return Err(Error::InvalidArgument("table cannot be null".to_string()));
        };

        let conflict_target: Vec<String> = meta
            .id_fields_list()
            .iter()
            .filter_map(|field| meta.field(field))
            .map(|column| column.column_name.clone())
            .collect();

        let mut builder = columns.iter().fold(UpsertBuilder::new(table), |b, column| {
            b.column(column.column_name.clone(), column.sql_type.clone())
        });
        builder = builder.conflict_target(conflict_target);

        let generator = meta.id_generator();
        for row in chunk {
            let mut values = Vec::with_capacity(fields.len());
            for field in &fields {
                let value = match generator {
                    // Identifiers are always regenerated from the row, even
                    // when the row already carries one.
                    Some(generator) if meta.is_id_field(field) => {
                        generator.generate_bulk(meta, row)?
                    }
                    _ => row.get(field).cloned().unwrap_or(Value::Null),
                };
                values.push(value);
            }
            builder.push_row(values);
        }

        Ok(builder)
    }

    /// Execute one chunk and return the id the database assigned, if any.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx, conn, chunk),
        fields(table = ?self.metadata.table_name(), rows = chunk.len())
    )]
    pub async fn execute_chunk<C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
        chunk: &[PendingRow],
    ) -> Outcome<Option<Value>, Error> {
        let builder = match self.build(chunk) {
            Ok(builder) => builder,
            Err(e) => return Outcome::Err(e),
        };

        tracing::debug!(
            rows = builder.row_count(),
            columns = builder.column_count(),
            "Executing upsert chunk"
        );

        match builder.execute(cx, conn).await {
            Outcome::Ok(_) => {}
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        if !self.returns_id() {
            return Outcome::Ok(None);
        }

        match conn.last_insert_id(cx).await {
            Outcome::Ok(Value::Null) => Outcome::Ok(None),
            Outcome::Ok(id) => Outcome::Ok(Some(id)),
            Outcome::Err(e) => Outcome::Err(e),
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Execute every chunk of `rows` in order.
    ///
    /// Stops at the first failing chunk; chunks executed before it stay
    /// written.
    #[tracing::instrument(level = "info", skip(self, cx, conn, rows))]
    pub async fn execute<C: Connection>(
        &self,
        cx: &Cx,
        conn: &C,
        rows: &[PendingRow],
        max_rows: usize,
    ) -> Outcome<FlushResult, Error> {
        let chunks = match plan::chunk(rows, max_rows) {
            Ok(chunks) => chunks,
            Err(e) => return Outcome::Err(e),
        };

        let start = std::time::Instant::now();
        let mut result = FlushResult::default();

        for chunk in chunks {
            match self.execute_chunk(cx, conn, chunk).await {
                Outcome::Ok(id) => {
                    result.statements += 1;
                    result.rows += chunk.len();
                    if result.last_insert_id.is_none() {
                        result.last_insert_id = id;
                    }
                }
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            rows = result.rows,
            statements = result.statements,
            "Bulk upsert complete"
        );

        Outcome::Ok(result)
    }
}

/// Summary of one flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushResult {
    /// Number of statements executed.
    pub statements: usize,
    /// Number of rows written.
    pub rows: usize,
    /// First non-null id reported by a chunk.
    pub last_insert_id: Option<Value>,
}

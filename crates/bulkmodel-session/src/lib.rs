//! Bulk upsert sessions for BulkModel Rust.
//!
//! `bulkmodel-session` is the **accumulation layer**. A [`BulkUpsert`] is bound
//! to one connection and one table; it validates rows as they are queued and
//! writes them with a handful of multi-row upserts on [`execute`](BulkUpsert::execute).
//!
//! # Role In The Architecture
//!
//! - **Row validation**: unknown fields, missing required values and missing
//!   defaults are rejected when a row is added, never at execution time.
//! - **Identifier generation**: a table's `IdGenerator` fills NULL identifiers.
//! - **Batching**: rows are optionally de-duplicated, then chunked and flushed
//!   in order (see [`plan`] and [`flush`]).
//!
//! The session never opens or commits transactions; wrap `execute` in one when
//! all-or-nothing behavior across chunks is needed.
//!
//! # Example
//!
//! ```ignore
//! let mut bulk = BulkUpsert::new(&conn, Author::table_metadata()?);
//!
//! bulk.add_entity(&mut author)?;
//! bulk.add_value(PendingRow::new().with("fullName", "Jane").with("otherData", "x"))?;
//!
//! let first_id = bulk.execute(&cx).await?;
//! ```

#![allow(clippy::result_large_err)] // Error type is defined in bulkmodel-core

pub mod flush;
pub mod plan;

pub use flush::{FlushResult, UpsertExecutor, field_superset};
pub use plan::{DEFAULT_MAX_ROWS, deduplicate};

use asupersync::{Cx, Outcome};
use bulkmodel_core::{
    BulkError, Connection, Entity, EntityMetadata, EntityState, Error, FieldValue, LifecycleEvent,
    ModelState, PendingRow, Result, TableMetadata, TypeError, Value,
};
use bulkmodel_core::field::ColumnMetadata;
use serde::{Deserialize, Serialize};

// ============================================================================
// Options
// ============================================================================

/// Options for [`BulkUpsert::execute_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsertOptions {
    /// Collapse rows with identical values before writing.
    pub ignore_duplicates: bool,
    /// Never ask the driver for the last inserted id.
    pub suppress_return_id: bool,
    /// Upper bound on rows per statement.
    pub max_rows: usize,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        Self {
            ignore_duplicates: false,
            suppress_return_id: false,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl UpsertOptions {
    /// Create new default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `ignore_duplicates` option (builder pattern).
    #[must_use]
    pub fn ignore_duplicates(mut self, value: bool) -> Self {
        self.ignore_duplicates = value;
        self
    }

    /// Set the `suppress_return_id` option (builder pattern).
    #[must_use]
    pub fn suppress_return_id(mut self, value: bool) -> Self {
        self.suppress_return_id = value;
        self
    }

    /// Set the `max_rows` option (builder pattern).
    #[must_use]
    pub fn max_rows(mut self, value: usize) -> Self {
        self.max_rows = value;
        self
    }
}

// ============================================================================
// Bulk Session
// ============================================================================

/// A queue of rows bound to one table, flushed as multi-row upserts.
///
/// Not meant to be shared: callers serialize access, or use one session per
/// unit of work.
pub struct BulkUpsert<'c, C: Connection> {
    connection: &'c C,
    metadata: TableMetadata,
    state: Box<dyn EntityState>,
    rows: Vec<PendingRow>,
}

impl<C: Connection> std::fmt::Debug for BulkUpsert<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkUpsert")
            .field("entity", &self.metadata.entity())
            .field("table", &self.metadata.table_name())
            .field("pending", &self.rows.len())
            .finish_non_exhaustive()
    }
}

impl<'c, C: Connection> BulkUpsert<'c, C> {
    /// Create a session writing through `connection` into `metadata`'s table.
    pub fn new(connection: &'c C, metadata: TableMetadata) -> Self {
        Self {
            connection,
            metadata,
            state: Box::new(ModelState),
            rows: Vec::new(),
        }
    }

    /// Create a session for an entity type that describes its own table.
    pub fn for_entity<E: EntityMetadata>(connection: &'c C) -> Result<Self> {
        Ok(Self::new(connection, E::table_metadata()?))
    }

    /// Replace the provider deciding whether an entity is new.
    #[must_use]
    pub fn with_state(mut self, state: impl EntityState + 'static) -> Self {
        self.state = Box::new(state);
        self
    }

    /// The table this session writes to.
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Number of queued rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no row is queued.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Queued rows, in order.
    pub fn pending(&self) -> &[PendingRow] {
        &self.rows
    }

    /// Drop every queued row without writing it.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Queue a pre-resolved row.
    ///
    /// Every key must be a declared field, and every non-nullable field must
    /// be present. No defaults are applied and no identifier is generated.
    pub fn add_value(&mut self, row: PendingRow) -> Result<()> {
        let meta = &self.metadata;

        if let Some(unknown) = row.fields().find(|field| !meta.has_field(field)) {
            return Err(BulkError::field_not_found(meta.entity(), unknown).into());
        }
        if let Some(missing) = meta
            .fields()
            .iter()
            .find(|column| !column.nullable && !row.contains(&column.field_name))
        {
            return Err(BulkError::null_value(meta.entity(), &missing.field_name).into());
        }

        tracing::trace!(fields = row.len(), "Queued raw row");
        self.rows.push(row);
        Ok(())
    }

    /// Queue several pre-resolved rows, stopping at the first invalid one.
    ///
    /// Rows before the invalid one stay queued.
    pub fn add_values<I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = PendingRow>,
    {
        for row in rows {
            self.add_value(row)?;
        }
        Ok(())
    }

    /// Queue an entity, asking the session's [`EntityState`] whether it is new.
    pub fn add_entity(&mut self, entity: &mut dyn Entity) -> Result<()> {
        self.add_entity_with_hint(entity, None)
    }

    /// Queue an entity.
    ///
    /// `is_new` overrides the session's [`EntityState`]; it only matters when
    /// the table declares lifecycle callbacks.
    #[tracing::instrument(
        level = "trace",
        skip(self, entity),
        fields(entity = %self.metadata.entity())
    )]
    pub fn add_entity_with_hint(
        &mut self,
        entity: &mut dyn Entity,
        is_new: Option<bool>,
    ) -> Result<()> {
        if entity.entity_name() != self.metadata.entity() {
            return Err(BulkError::wrong_entity(self.metadata.entity(), entity.entity_name()).into());
        }

        self.run_lifecycle_callbacks(entity, is_new)?;

        let row = self.entity_row(&*entity)?;
        self.rows.push(row);
        Ok(())
    }

    /// Queue several entities, stopping at the first failure.
    ///
    /// Entities before the failing one stay queued.
    pub fn add_entities<'e, E, I>(&mut self, entities: I) -> Result<()>
    where
        E: Entity + 'e,
        I: IntoIterator<Item = &'e mut E>,
    {
        for entity in entities {
            self.add_entity(entity)?;
        }
        Ok(())
    }

    /// Write every queued row using default options.
    ///
    /// Returns the first id the database assigned, or `None`.
    pub async fn execute(&mut self, cx: &Cx) -> Outcome<Option<Value>, Error> {
        self.execute_with(cx, UpsertOptions::default()).await
    }

    /// Write every queued row.
    ///
    /// The queue is cleared only when every chunk succeeded; after a failure
    /// the rows stay queued, including those of chunks already written.
    /// With `ignore_duplicates` the queue is replaced by its deduplicated
    /// rows before the first chunk runs, so a failure leaves those.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx),
        fields(table = ?self.metadata.table_name(), pending = self.rows.len())
    )]
    pub async fn execute_with(
        &mut self,
        cx: &Cx,
        options: UpsertOptions,
    ) -> Outcome<Option<Value>, Error> {
        if let Err(e) = plan::validate_max_rows(options.max_rows) {
            return Outcome::Err(e);
        }
        if self.rows.is_empty() {
            return Outcome::Ok(None);
        }

        if options.ignore_duplicates {
            let (rows, dropped) = plan::deduplicate(std::mem::take(&mut self.rows));
            self.rows = rows;
            if dropped > 0 {
                tracing::warn!(
                    dropped = dropped,
                    remaining = self.rows.len(),
                    "Dropped duplicate rows"
                );
            }
        }

        let executor = UpsertExecutor::new(&self.metadata, options.suppress_return_id);
        let result = match executor
            .execute(cx, self.connection, &self.rows, options.max_rows)
            .await
        {
            Outcome::Ok(result) => result,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        self.rows.clear();
        Outcome::Ok(result.last_insert_id)
    }

    // ------------------------------------------------------------------------
    // Entity extraction
    // ------------------------------------------------------------------------

    fn run_lifecycle_callbacks(&self, entity: &mut dyn Entity, hint: Option<bool>) -> Result<()> {
        let callbacks = self.metadata.lifecycle_callbacks();
        if callbacks.is_empty() {
            return Ok(());
        }

        let is_new = match hint {
            Some(is_new) => is_new,
            None => match self.state.is_new(&*entity) {
                Ok(is_new) => is_new,
                Err(e) if e.is_table_not_found() => true,
                Err(e) => return Err(e),
            },
        };

        for (event, names) in callbacks {
            let fire = match event {
                LifecycleEvent::PrePersist => is_new,
                LifecycleEvent::PreUpdate => !is_new,
                _ => false,
            };
            if !fire {
                continue;
            }
            for name in names {
                tracing::trace!(event = ?event, callback = %name, "Running lifecycle callback");
                entity.run_callback(name)?;
            }
        }
        Ok(())
    }

    fn entity_row(&self, entity: &dyn Entity) -> Result<PendingRow> {
        let meta = &self.metadata;
        let mut row = PendingRow::with_capacity(meta.fields().len());

        for column in meta.fields() {
            let value = match self.read_field(entity, column)? {
                Some(value) => {
                    if value.is_null() && !column.nullable {
                        return Err(BulkError::null_value(meta.entity(), &column.field_name).into());
                    }
                    value
                }
                // Declared defaults are taken as-is, NULL included.
                None => match &column.default {
                    Some(default) => default.clone(),
                    None => {
                        return Err(
                            BulkError::no_default_value(meta.entity(), &column.field_name).into()
                        );
                    }
                },
            };
            row.set(column.field_name.clone(), value);
        }

        if let Some(generator) = meta.id_generator() {
            for field in meta.id_fields_list() {
                if row.get(field).is_none_or(Value::is_null) {
                    let id = generator.generate_bulk(meta, &row)?;
                    row.set(field.clone(), id);
                }
            }
        }

        Ok(row)
    }

    /// Read one column's value off an entity; `None` when uninitialized.
    fn read_field(&self, entity: &dyn Entity, column: &ColumnMetadata) -> Result<Option<Value>> {
        match entity.field_value(&column.field_name) {
            FieldValue::Uninitialized => Ok(None),
            FieldValue::Set(value) => Ok(Some(value)),
            FieldValue::Related(None) => Ok(Some(Value::Null)),
            FieldValue::Related(Some(related)) => {
                let Some(referenced) = column.referenced_field() else {
                    return Err(TypeError {
                        expected: "scalar value",
                        actual: format!("related {}", related.entity_name()),
                        column: Some(column.column_name.clone()),
                    }
                    .into());
                };
                match related.field_value(referenced) {
                    FieldValue::Uninitialized => Ok(None),
                    FieldValue::Set(value) => Ok(Some(value)),
                    FieldValue::Related(_) => Err(TypeError {
                        expected: "scalar value",
                        actual: format!("nested relation {}.{}", related.entity_name(), referenced),
                        column: Some(column.column_name.clone()),
                    }
                    .into()),
                }
            }
        }
    }
}

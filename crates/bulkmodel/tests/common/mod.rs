//! Shared fixtures: a recording connection and three mapped entity types.
#![allow(dead_code)]

use asupersync::CancelReason;
use asupersync::runtime::RuntimeBuilder;
use bulkmodel::prelude::*;
use bulkmodel::{PreparedStatement, QueryError};
use std::sync::{Arc, Mutex};

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

pub fn expect_err<T: std::fmt::Debug>(outcome: Outcome<T, Error>) -> Error {
    match outcome {
        Outcome::Err(e) => e,
        other => panic!("expected an error, got {other:?}"),
    }
}

/// Drive a future to completion on a fresh single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> F::Output {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    rt.block_on(future)
}

// ============================================================================
// Recording connection
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
    pub param_types: Vec<SqlType>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub prepared: Vec<String>,
    pub executed: Vec<Executed>,
    pub last_insert_id_calls: usize,
    /// Fail the execution with this 0-based index.
    pub fail_on_execute: Option<usize>,
    /// Report cancellation for the execution with this 0-based index.
    pub cancel_on_execute: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct MockConnection {
    pub state: Arc<Mutex<MockState>>,
    dialect: Dialect,
    last_id: Value,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            dialect: Dialect::Mysql,
            last_id: Value::BigInt(17),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_last_id(mut self, id: Value) -> Self {
        self.last_id = id;
        self
    }

    pub fn fail_on_execute(self, index: usize) -> Self {
        self.state.lock().expect("lock poisoned").fail_on_execute = Some(index);
        self
    }

    pub fn cancel_on_execute(self, index: usize) -> Self {
        self.state.lock().expect("lock poisoned").cancel_on_execute = Some(index);
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state.lock().expect("lock poisoned").executed.clone()
    }

    pub fn prepared_count(&self) -> usize {
        self.state.lock().expect("lock poisoned").prepared.len()
    }

    pub fn last_insert_id_calls(&self) -> usize {
        self.state.lock().expect("lock poisoned").last_insert_id_calls
    }

    /// Row tuples per executed statement.
    pub fn rows_per_statement(&self) -> Vec<usize> {
        self.executed()
            .iter()
            .map(|e| e.sql.matches("), (").count() + 1)
            .collect()
    }
}

impl Connection for MockConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn prepare(
        &self,
        _cx: &Cx,
        sql: &str,
    ) -> impl Future<Output = Outcome<PreparedStatement, Error>> + Send {
        let state = Arc::clone(&self.state);
        let sql = sql.to_string();
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.prepared.push(sql.clone());
            let id = guard.prepared.len() as u64;
            Outcome::Ok(PreparedStatement::new(id, sql, 0))
        }
    }

    fn execute_prepared(
        &self,
        _cx: &Cx,
        stmt: &PreparedStatement,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let state = Arc::clone(&self.state);
        let executed = Executed {
            sql: stmt.sql().to_string(),
            params: params.to_vec(),
            param_types: stmt.param_types().to_vec(),
        };
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            if guard.cancel_on_execute == Some(guard.executed.len()) {
                return Outcome::Cancelled(CancelReason::user("statement cancelled"));
            }
            if guard.fail_on_execute == Some(guard.executed.len()) {
                return Outcome::Err(Error::Query(QueryError {
                    kind: bulkmodel::QueryErrorKind::Database,
                    sql: Some(executed.sql),
                    sqlstate: Some("HY000".to_string()),
                    message: "server has gone away".to_string(),
                    source: None,
                }));
            }
            let count = executed.params.len() as u64;
            guard.executed.push(executed);
            Outcome::Ok(count)
        }
    }

    fn last_insert_id(&self, _cx: &Cx) -> impl Future<Output = Outcome<Value, Error>> + Send {
        let state = Arc::clone(&self.state);
        let id = self.last_id.clone();
        async move {
            state.lock().expect("lock poisoned").last_insert_id_calls += 1;
            Outcome::Ok(id)
        }
    }
}

// ============================================================================
// Author: hashed identifier over (fullName, otherData)
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Author {
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub other_data: Option<String>,
}

impl Author {
    pub fn new(full_name: &str, other_data: &str) -> Self {
        Self {
            id: None,
            full_name: Some(full_name.to_string()),
            other_data: Some(other_data.to_string()),
        }
    }
}

impl Entity for Author {
    fn entity_name(&self) -> &str {
        "Author"
    }

    fn field_value(&self, field: &str) -> FieldValue<'_> {
        let value = match field {
            "id" => return FieldValue::Set(self.id.clone().into()),
            "fullName" => &self.full_name,
            "otherData" => &self.other_data,
            _ => return FieldValue::Uninitialized,
        };
        value
            .clone()
            .map_or(FieldValue::Uninitialized, |v| FieldValue::Set(v.into()))
    }
}

impl EntityMetadata for Author {
    fn table_metadata() -> Result<TableMetadata> {
        TableMetadata::new("Author")
            .table("authors")
            .column(ColumnMetadata::new("id", "id", SqlType::Char(25)).nullable(true))
            .column(ColumnMetadata::new("fullName", "full_name", SqlType::VarChar(255)))
            .column(ColumnMetadata::new("otherData", "other_data", SqlType::Text))
            .id_fields(["id"])
            .hashed_id_fields(["fullName", "otherData"])
            .generator_strategy(GeneratorStrategy::Hashed)
    }
}

// ============================================================================
// Book: database-assigned id, join column to Author
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Book {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<Author>,
    pub pages: Option<i32>,
}

impl Entity for Book {
    fn entity_name(&self) -> &str {
        "Book"
    }

    fn field_value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "id" => FieldValue::Set(self.id.into()),
            "title" => self
                .title
                .clone()
                .map_or(FieldValue::Uninitialized, |t| FieldValue::Set(t.into())),
            "author" => FieldValue::Related(self.author.as_ref().map(|a| a as &dyn Entity)),
            "pages" => self
                .pages
                .map_or(FieldValue::Uninitialized, |p| FieldValue::Set(p.into())),
            _ => FieldValue::Uninitialized,
        }
    }
}

impl EntityMetadata for Book {
    fn table_metadata() -> Result<TableMetadata> {
        Ok(TableMetadata::new("Book")
            .table("books")
            .column(ColumnMetadata::new("id", "id", SqlType::BigInt).nullable(true))
            .column(ColumnMetadata::new("title", "title", SqlType::VarChar(255)))
            .join_column(
                ColumnMetadata::new("author", "author_id", SqlType::Char(25)).nullable(true),
                "id",
            )
            .column(ColumnMetadata::new("pages", "page_count", SqlType::Integer).default(0_i32))
            .id_fields(["id"])
            .generator_strategy(GeneratorStrategy::Identity)?)
    }
}

// ============================================================================
// Magazine: composite key, timestamps maintained by lifecycle callbacks
// ============================================================================

pub const NOW: &str = "2022-03-01 12:00:00";

#[derive(Debug, Clone, Default)]
pub struct Magazine {
    pub year: i32,
    pub month: i32,
    pub title: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub persisted: bool,
}

impl Magazine {
    pub fn new(year: i32, month: i32, title: &str) -> Self {
        Self {
            year,
            month,
            title: Some(title.to_string()),
            ..Self::default()
        }
    }
}

impl Entity for Magazine {
    fn entity_name(&self) -> &str {
        "Magazine"
    }

    fn field_value(&self, field: &str) -> FieldValue<'_> {
        match field {
            "year" => FieldValue::Set(self.year.into()),
            "month" => FieldValue::Set(self.month.into()),
            "title" => self
                .title
                .clone()
                .map_or(FieldValue::Uninitialized, |t| FieldValue::Set(t.into())),
            "createdAt" => self
                .created_at
                .clone()
                .map_or(FieldValue::Uninitialized, |t| FieldValue::Set(t.into())),
            "updatedAt" => self
                .updated_at
                .clone()
                .map_or(FieldValue::Uninitialized, |t| FieldValue::Set(t.into())),
            _ => FieldValue::Uninitialized,
        }
    }

    fn run_callback(&mut self, name: &str) -> Result<()> {
        match name {
            "onCreate" => self.created_at = Some(NOW.to_string()),
            "onUpdate" => self.updated_at = Some(NOW.to_string()),
            other => return Err(Error::Custom(format!("unknown callback {other}"))),
        }
        Ok(())
    }

    fn is_new(&self) -> bool {
        !self.persisted
    }
}

impl EntityMetadata for Magazine {
    fn table_metadata() -> Result<TableMetadata> {
        Ok(TableMetadata::new("Magazine")
            .table("magazines")
            .column(ColumnMetadata::new("year", "year", SqlType::Integer))
            .column(ColumnMetadata::new("month", "month", SqlType::TinyInt))
            .column(ColumnMetadata::new("title", "title", SqlType::VarChar(255)))
            .column(
                ColumnMetadata::new("createdAt", "created_at", SqlType::DateTime)
                    .nullable(true)
                    .default(Value::Null),
            )
            .column(
                ColumnMetadata::new("updatedAt", "updated_at", SqlType::DateTime)
                    .nullable(true)
                    .default(Value::Null),
            )
            .id_fields(["year", "month"])
            .lifecycle_callback(LifecycleEvent::PrePersist, "onCreate")
            .lifecycle_callback(LifecycleEvent::PreUpdate, "onUpdate"))
    }
}

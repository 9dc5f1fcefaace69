//! Multi-row upsert statement builder.

use asupersync::{Cx, Outcome};
use bulkmodel_core::{Connection, Dialect, Error, Result, SqlType, Value};

/// Multi-row `INSERT` that refreshes every inserted column on a key conflict.
///
/// Columns are given by database name; every row must bind one value per
/// column, in column order.
///
/// ```ignore
/// let (sql, params) = UpsertBuilder::new("books")
///     .column("id", SqlType::BigInt)
///     .column("title", SqlType::VarChar(255))
///     .row(vec![Value::Null, Value::from("Dune")])
///     .build_with_dialect(Dialect::Mysql)?;
/// // INSERT INTO `books` (`id`, `title`) VALUES (?, ?)
/// //     ON DUPLICATE KEY UPDATE `id`=VALUES(`id`), `title`=VALUES(`title`)
/// ```
#[derive(Debug, Clone)]
pub struct UpsertBuilder {
    table: String,
    columns: Vec<(String, SqlType)>,
    conflict_target: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl UpsertBuilder {
    /// Create a builder for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            conflict_target: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a column and the type hint its parameters are bound with.
    pub fn column(mut self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.columns.push((name.into(), sql_type));
        self
    }

    /// Set the columns an `ON CONFLICT` clause targets.
    ///
    /// Ignored for MySQL, which resolves conflicts against every unique key.
    pub fn conflict_target<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflict_target = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append one row of values.
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    /// Append one row of values in place.
    pub fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push(values);
    }

    /// Number of rows appended so far.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Type hints for every bound parameter, row-major.
    pub fn param_types(&self) -> Vec<SqlType> {
        let mut types = Vec::with_capacity(self.rows.len() * self.columns.len());
        for _ in &self.rows {
            types.extend(self.columns.iter().map(|(_, ty)| ty.clone()));
        }
        types
    }

    /// Build the SQL and parameters, quoting identifiers the dialect's way.
    pub fn build_with_dialect(&self, dialect: Dialect) -> Result<(String, Vec<Value>)> {
        self.build_with(dialect, |name| dialect.quote_identifier(name))
    }

    /// Build the SQL and parameters with a custom identifier quoting function.
    pub fn build_with<F>(&self, dialect: Dialect, quote: F) -> Result<(String, Vec<Value>)>
    where
        F: Fn(&str) -> String,
    {
        if self.columns.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "no columns to insert into {}",
                self.table
            )));
        }
        if self.rows.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "no rows to insert into {}",
                self.table
            )));
        }
        if dialect.requires_conflict_target() && self.conflict_target.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "{dialect} upsert into {} needs identifier columns as conflict target",
                self.table
            )));
        }

        let columns: Vec<String> = self.columns.iter().map(|(name, _)| quote(name)).collect();

        let mut params = Vec::with_capacity(self.rows.len() * columns.len());
        let mut tuples = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::InvalidArgument(format!(
                    "row {idx} binds {} values for {} columns",
                    row.len(),
                    columns.len()
                )));
            }
            let placeholders: Vec<String> = (1..=row.len())
                .map(|i| dialect.placeholder(params.len() + i))
                .collect();
            tuples.push(format!("({})", placeholders.join(", ")));
            params.extend(row.iter().cloned());
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote(&self.table),
            columns.join(", "),
            tuples.join(", ")
        );

        match dialect {
            Dialect::Mysql => {
                let updates: Vec<String> = columns
                    .iter()
                    .map(|col| format!("{col}=VALUES({col})"))
                    .collect();
                sql.push_str(" ON DUPLICATE KEY UPDATE ");
                sql.push_str(&updates.join(", "));
            }
            Dialect::Postgres | Dialect::Sqlite => {
                let target: Vec<String> = self.conflict_target.iter().map(|c| quote(c)).collect();
                let updates: Vec<String> = columns
                    .iter()
                    .map(|col| format!("{col}=excluded.{col}"))
                    .collect();
                sql.push_str(&format!(
                    " ON CONFLICT ({}) DO UPDATE SET {}",
                    target.join(", "),
                    updates.join(", ")
                ));
            }
        }

        Ok((sql, params))
    }

    /// Prepare and execute the statement on `conn`, returning rows affected.
    pub async fn execute<C: Connection>(&self, cx: &Cx, conn: &C) -> Outcome<u64, Error> {
        let (sql, params) = match self.build_with(conn.dialect(), |name| conn.quote_identifier(name)) {
            Ok(built) => built,
            Err(e) => return Outcome::Err(e),
        };
        tracing::trace!(sql = %sql, params = params.len(), "Executing upsert");

        let stmt = match conn.prepare(cx, &sql).await {
            Outcome::Ok(stmt) => stmt.with_param_types(self.param_types()),
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };

        conn.execute_prepared(cx, &stmt, &params).await
    }
}

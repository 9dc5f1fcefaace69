//! Error types for BulkModel operations.

use std::fmt;

/// The primary error type for all BulkModel operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (connect, disconnect, timeout)
    Connection(ConnectionError),
    /// Query execution errors reported by the driver
    Query(QueryError),
    /// Value conversion errors reported by the driver
    Type(TypeError),
    /// Schema errors (missing tables, unknown columns)
    Schema(SchemaError),
    /// Row validation and identifier generation errors raised before any SQL is built
    Bulk(BulkError),
    /// An argument or metadata value that makes the operation meaningless
    InvalidArgument(String),
    /// Operation was cancelled via asupersync
    Cancelled,
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Authentication failed
    Authentication,
    /// Connection lost during operation
    Disconnected,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub sqlstate: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Data too large for column
    DataTruncation,
    /// Deadlock detected
    Deadlock,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Table not found
    TableNotFound,
    /// Column not found
    ColumnNotFound,
    /// Invalid schema definition
    Invalid,
}

/// A row was rejected while being queued, or its identifier could not be generated.
#[derive(Debug, Clone)]
pub struct BulkError {
    pub kind: BulkErrorKind,
    /// The entity type the bulk session is bound to
    pub entity: String,
    /// The offending field, when the failure is tied to one
    pub field: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkErrorKind {
    /// A raw row references a field the table does not declare
    FieldNotFound,
    /// A required field is missing or resolves to NULL
    NullValue,
    /// A field was never set on the entity and has no declared default
    NoDefaultValue,
    /// The entity's type differs from the type the session is bound to
    WrongEntity,
    /// A field needed to derive an identifier is missing from the row
    CannotGenerateId,
    /// The entity does not provide what the configured generator needs
    EntityNotSupported,
    /// The configured generator cannot run in bulk mode
    NotSupportedIdGenerator,
}

impl BulkError {
    pub fn field_not_found(entity: impl Into<String>, field: impl Into<String>) -> Self {
        let (entity, field) = (entity.into(), field.into());
        Self {
            kind: BulkErrorKind::FieldNotFound,
            message: format!("field \"{field}\" not found in \"{entity}\""),
            entity,
            field: Some(field),
        }
    }

    pub fn null_value(entity: impl Into<String>, field: impl Into<String>) -> Self {
        let (entity, field) = (entity.into(), field.into());
        Self {
            kind: BulkErrorKind::NullValue,
            message: format!("null is not allowed in field \"{field}\" of \"{entity}\""),
            entity,
            field: Some(field),
        }
    }

    pub fn no_default_value(entity: impl Into<String>, field: impl Into<String>) -> Self {
        let (entity, field) = (entity.into(), field.into());
        Self {
            kind: BulkErrorKind::NoDefaultValue,
            message: format!("no default value for field \"{field}\" of \"{entity}\""),
            entity,
            field: Some(field),
        }
    }

    pub fn wrong_entity(expected: impl Into<String>, actual: &str) -> Self {
        let entity = expected.into();
        Self {
            kind: BulkErrorKind::WrongEntity,
            message: format!("bulk session created for \"{entity}\", but \"{actual}\" added"),
            entity,
            field: None,
        }
    }

    pub fn cannot_generate_id(entity: impl Into<String>, field: impl Into<String>) -> Self {
        let (entity, field) = (entity.into(), field.into());
        Self {
            kind: BulkErrorKind::CannotGenerateId,
            message: format!(
                "cannot generate id for \"{entity}\": required field \"{field}\" does not exist"
            ),
            entity,
            field: Some(field),
        }
    }

    pub fn entity_not_supported(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            kind: BulkErrorKind::EntityNotSupported,
            message: format!(
                "entity \"{entity}\" must provide hashed id fields to be used with the hashed id generator"
            ),
            entity,
            field: None,
        }
    }

    pub fn not_supported_id_generator(entity: impl Into<String>, generator: &str) -> Self {
        Self {
            kind: BulkErrorKind::NotSupportedIdGenerator,
            message: format!("id generator \"{generator}\" cannot be used in bulk operations"),
            entity: entity.into(),
            field: None,
        }
    }
}

impl Error {
    /// The bulk failure kind, if this is a row validation or generation error.
    pub fn bulk_kind(&self) -> Option<BulkErrorKind> {
        match self {
            Error::Bulk(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Is this a row validation or identifier generation error?
    pub fn is_bulk(&self) -> bool {
        matches!(self, Error::Bulk(_))
    }

    /// Is this the driver telling us the target table does not exist yet?
    pub fn is_table_not_found(&self) -> bool {
        matches!(
            self,
            Error::Schema(SchemaError {
                kind: SchemaErrorKind::TableNotFound,
                ..
            })
        )
    }

    /// Get SQLSTATE if available (e.g., "23000" for a duplicate key)
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sqlstate.as_deref(),
            _ => None,
        }
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => {
                if let Some(sqlstate) = &e.sqlstate {
                    write!(f, "Query error (SQLSTATE {}): {}", sqlstate, e.message)
                } else {
                    write!(f, "Query error: {}", e.message)
                }
            }
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Schema(e) => write!(f, "Schema error: {}", e.message),
            Error::Bulk(e) => write!(f, "Bulk error: {}", e.message),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::Cancelled => write!(f, "Operation cancelled"),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Schema(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sqlstate) = &self.sqlstate {
            write!(f, "{} (SQLSTATE {})", self.message, sqlstate)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for BulkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BulkError {}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<BulkError> for Error {
    fn from(err: BulkError) -> Self {
        Error::Bulk(err)
    }
}

/// Result type alias for BulkModel operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Field and column definitions.

use crate::types::SqlType;
use crate::value::Value;

/// Metadata about one mapped field of the target table.
///
/// `field_name` is the logical name rows are keyed by; `column_name` is the
/// database identifier the statement uses.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    /// Logical field name
    pub field_name: String,
    /// Database column name (may differ from field name)
    pub column_name: String,
    /// SQL type, used as the binding hint
    pub sql_type: SqlType,
    /// Whether this column accepts NULL
    pub nullable: bool,
    /// Declared default. `Some(Value::Null)` is a real default of NULL;
    /// `None` means the column has no default at all.
    pub default: Option<Value>,
    /// Set when the field holds a related entity
    pub join: Option<JoinColumn>,
}

/// How to turn a related entity into the stored column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinColumn {
    /// Field read off the related entity (usually its primary key)
    pub referenced_field: String,
}

impl ColumnMetadata {
    /// Create a non-nullable column without a default.
    pub fn new(
        field_name: impl Into<String>,
        column_name: impl Into<String>,
        sql_type: SqlType,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            column_name: column_name.into(),
            sql_type,
            nullable: false,
            default: None,
            join: None,
        }
    }

    /// Set nullable flag.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set the default value used when an entity never initialized the field.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Turn this column into a join column reading `referenced_field` off the related entity.
    pub fn references(mut self, referenced_field: impl Into<String>) -> Self {
        self.join = Some(JoinColumn {
            referenced_field: referenced_field.into(),
        });
        self
    }

    /// Whether a default is declared (possibly NULL).
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Whether this is a join column.
    pub fn is_join(&self) -> bool {
        self.join.is_some()
    }

    /// The field read off a related entity, for join columns.
    pub fn referenced_field(&self) -> Option<&str> {
        self.join.as_ref().map(|j| j.referenced_field.as_str())
    }
}

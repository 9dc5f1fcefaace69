//! Entity accessor contract.
//!
//! Bulk sessions never reflect over a type. Instead each domain type
//! implements [`Entity`], which hands out field values together with the
//! information whether the field was ever set. That distinction drives
//! default resolution: an uninitialized field falls back to the column
//! default, an explicit NULL does not.

use crate::Result;
use crate::error::Error;
use crate::metadata::TableMetadata;
use crate::value::Value;

/// The current state of one field on an entity.
pub enum FieldValue<'a> {
    /// The entity never assigned this field.
    Uninitialized,
    /// The field holds a plain value (possibly NULL).
    Set(Value),
    /// The field holds a related entity, or `None` for an empty relation.
    ///
    /// Only valid for join columns; the stored value is read off the
    /// related entity's referenced field.
    Related(Option<&'a dyn Entity>),
}

impl std::fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Uninitialized => write!(f, "Uninitialized"),
            FieldValue::Set(v) => f.debug_tuple("Set").field(v).finish(),
            FieldValue::Related(Some(e)) => write!(f, "Related({})", e.entity_name()),
            FieldValue::Related(None) => write!(f, "Related(None)"),
        }
    }
}

impl From<Value> for FieldValue<'_> {
    fn from(value: Value) -> Self {
        FieldValue::Set(value)
    }
}

/// A domain object that can be queued into a bulk session.
///
/// # Example
///
/// ```ignore
/// struct Author {
///     id: Option<String>,
///     full_name: Option<String>,
/// }
///
/// impl Entity for Author {
///     fn entity_name(&self) -> &str {
///         "Author"
///     }
///
///     fn field_value(&self, field: &str) -> FieldValue<'_> {
///         match field {
///             "id" => FieldValue::Set(self.id.clone().into()),
///             "fullName" => match &self.full_name {
///                 Some(name) => FieldValue::Set(name.clone().into()),
///                 None => FieldValue::Uninitialized,
///             },
///             _ => FieldValue::Uninitialized,
///         }
///     }
/// }
/// ```
pub trait Entity {
    /// Runtime type name, compared against the type a session is bound to.
    fn entity_name(&self) -> &str;

    /// Read one field.
    fn field_value(&self, field: &str) -> FieldValue<'_>;

    /// Invoke a named lifecycle callback declared in the table metadata.
    ///
    /// The default implementation knows no callbacks.
    fn run_callback(&mut self, name: &str) -> Result<()> {
        Err(Error::Custom(format!(
            "entity \"{}\" has no lifecycle callback \"{}\"",
            self.entity_name(),
            name
        )))
    }

    /// Whether the entity has no persisted representation yet.
    ///
    /// Used by [`ModelState`], the default [`EntityState`].
    fn is_new(&self) -> bool {
        true
    }
}

/// Metadata provider: maps an entity type to its table description.
pub trait EntityMetadata: Entity + Sized {
    /// Build the table metadata for this type.
    fn table_metadata() -> Result<TableMetadata>;
}

/// Decides whether an entity is new or already persisted.
///
/// Implementations backed by the store should report a missing table as
/// [`SchemaErrorKind::TableNotFound`](crate::error::SchemaErrorKind::TableNotFound);
/// the bulk session treats that as "new".
pub trait EntityState: Send + Sync {
    fn is_new(&self, entity: &dyn Entity) -> Result<bool>;
}

/// Default [`EntityState`] that asks the entity itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelState;

impl EntityState for ModelState {
    fn is_new(&self, entity: &dyn Entity) -> Result<bool> {
        Ok(entity.is_new())
    }
}

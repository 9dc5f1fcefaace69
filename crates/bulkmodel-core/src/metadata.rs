//! Table metadata consumed by bulk sessions.

use crate::Result;
use crate::field::ColumnMetadata;
use crate::generator::{GeneratorStrategy, IdGenerator};
use std::collections::HashMap;
use std::sync::Arc;

/// Persistence lifecycle events a mapping can attach callbacks to.
///
/// Bulk sessions only fire [`PrePersist`](Self::PrePersist) (new rows) and
/// [`PreUpdate`](Self::PreUpdate) (existing rows). The others are accepted
/// so mappings can be loaded unchanged, and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    PrePersist,
    PostPersist,
    PreUpdate,
    PostUpdate,
    PreRemove,
    PostRemove,
    PostLoad,
}

impl LifecycleEvent {
    /// Parse a mapping's event name (`prePersist`, `pre_persist`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.replace('_', "").to_ascii_lowercase().as_str() {
            "prepersist" => Some(LifecycleEvent::PrePersist),
            "postpersist" => Some(LifecycleEvent::PostPersist),
            "preupdate" => Some(LifecycleEvent::PreUpdate),
            "postupdate" => Some(LifecycleEvent::PostUpdate),
            "preremove" => Some(LifecycleEvent::PreRemove),
            "postremove" => Some(LifecycleEvent::PostRemove),
            "postload" => Some(LifecycleEvent::PostLoad),
            _ => None,
        }
    }
}

/// Immutable description of a bulk session's target table.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    entity: String,
    table: Option<String>,
    fields: Vec<ColumnMetadata>,
    field_index: HashMap<String, usize>,
    id_fields: Vec<String>,
    generator: Option<Arc<dyn IdGenerator>>,
    hashed_id_fields: Option<Vec<String>>,
    lifecycle_callbacks: Vec<(LifecycleEvent, Vec<String>)>,
}

impl TableMetadata {
    /// Start describing the table for `entity`.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            table: None,
            fields: Vec::new(),
            field_index: HashMap::new(),
            id_fields: Vec::new(),
            generator: None,
            hashed_id_fields: None,
            lifecycle_callbacks: Vec::new(),
        }
    }

    /// Set the database table name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Add a column. Re-declaring a field replaces it in place.
    pub fn column(mut self, column: ColumnMetadata) -> Self {
        if let Some(&idx) = self.field_index.get(&column.field_name) {
            self.fields[idx] = column;
        } else {
            self.field_index
                .insert(column.field_name.clone(), self.fields.len());
            self.fields.push(column);
        }
        self
    }

    /// Add a join column whose value is read off the related entity's `referenced` field.
    pub fn join_column(self, column: ColumnMetadata, referenced: impl Into<String>) -> Self {
        self.column(column.references(referenced))
    }

    /// Set the ordered identifier fields.
    pub fn id_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Install a client-side identifier generator.
    pub fn generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Install the generator a mapping's strategy resolves to.
    pub fn generator_strategy(mut self, strategy: GeneratorStrategy) -> Result<Self> {
        self.generator = strategy.into_generator(&self.entity)?;
        Ok(self)
    }

    /// Declare the fields the hashed generator digests, in order.
    pub fn hashed_id_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashed_id_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Append a callback method name for `event`.
    pub fn lifecycle_callback(mut self, event: LifecycleEvent, name: impl Into<String>) -> Self {
        let name = name.into();
        if let Some((_, names)) = self
            .lifecycle_callbacks
            .iter_mut()
            .find(|(e, _)| *e == event)
        {
            names.push(name);
        } else {
            self.lifecycle_callbacks.push((event, vec![name]));
        }
        self
    }

    /// The entity type name this table belongs to.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The database table name, if configured.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// All columns in declaration order.
    pub fn fields(&self) -> &[ColumnMetadata] {
        &self.fields
    }

    /// Look up a column by field name.
    pub fn field(&self, name: &str) -> Option<&ColumnMetadata> {
        self.field_index.get(name).map(|&idx| &self.fields[idx])
    }

    /// Check if the table declares a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.field_index.contains_key(name)
    }

    /// Identifier fields in order.
    pub fn id_fields_list(&self) -> &[String] {
        &self.id_fields
    }

    /// Check if `name` is one of the identifier fields.
    pub fn is_id_field(&self, name: &str) -> bool {
        self.id_fields.iter().any(|f| f == name)
    }

    /// The configured generator, if any.
    pub fn id_generator(&self) -> Option<&Arc<dyn IdGenerator>> {
        self.generator.as_ref()
    }

    /// Fields digested by the hashed generator, when the entity provides them.
    pub fn hashed_id_fields_list(&self) -> Option<&[String]> {
        self.hashed_id_fields.as_deref()
    }

    /// Declared callbacks, grouped by event in declaration order.
    pub fn lifecycle_callbacks(&self) -> &[(LifecycleEvent, Vec<String>)] {
        &self.lifecycle_callbacks
    }

    /// Callbacks declared for one event.
    pub fn callbacks_for(&self, event: LifecycleEvent) -> &[String] {
        self.lifecycle_callbacks
            .iter()
            .find(|(e, _)| *e == event)
            .map_or(&[], |(_, names)| names.as_slice())
    }
}

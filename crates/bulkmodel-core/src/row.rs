//! Queued row representation.

use crate::value::Value;

/// One not-yet-flushed record: field name → value, in insertion order.
///
/// Order matters twice: it decides the column order of a chunk's statement
/// (first-seen across rows), and it decides the duplicate-detection key.
/// A field that is absent is different from a field set to `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingRow {
    entries: Vec<(String, Value)>,
}

impl PendingRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Set a field. An existing field keeps its position and gets the new value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(name, _)| *name == field) {
            slot.1 = value;
        } else {
            self.entries.push((field, value));
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Get a field's value, `None` when the field is absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Check if the field is present (even when it holds NULL).
    pub fn contains(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no field is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// `(field, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Every value rendered as plain text and joined with `separator`.
    pub fn joined_values(&self, separator: &str) -> String {
        self.values()
            .map(Value::to_plain_string)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PendingRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = PendingRow::new();
        for (field, value) in iter {
            row.set(field, value);
        }
        row
    }
}

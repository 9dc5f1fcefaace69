mod common;

use bulkmodel::prelude::*;
use bulkmodel::{BulkErrorKind, SchemaError, SchemaErrorKind};
use common::{Author, Book, Magazine, MockConnection, NOW};
use std::cell::Cell;

#[test]
fn add_value_requires_every_non_nullable_field() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Book>(&conn).unwrap();

    // "pages" has a default but is not nullable, so raw rows must carry it.
    let err = bulk
        .add_value(PendingRow::new().with("title", "Dune"))
        .unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::NullValue));
    assert_eq!(
        err.to_string(),
        "Bulk error: null is not allowed in field \"pages\" of \"Book\""
    );

    let row = PendingRow::new().with("title", "Dune").with("pages", 412_i32);
    bulk.add_value(row.clone()).unwrap();
    assert_eq!(bulk.pending(), &[row]);
}

#[test]
fn add_value_rejects_unknown_fields_first() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Book>(&conn).unwrap();

    // Unknown key wins over the missing required fields.
    let err = bulk
        .add_value(PendingRow::new().with("isbn", "978-0441013593"))
        .unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::FieldNotFound));
    assert!(err.to_string().contains("\"isbn\""));
    assert!(bulk.is_empty());
}

#[test]
fn add_values_stops_at_first_invalid_row() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Book>(&conn).unwrap();

    let err = bulk
        .add_values([
            PendingRow::new().with("title", "A").with("pages", 1_i32),
            PendingRow::new().with("title", "B"),
            PendingRow::new().with("title", "C").with("pages", 3_i32),
        ])
        .unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::NullValue));
    assert_eq!(bulk.len(), 1);
}

/// Counts every access a session makes.
#[derive(Default)]
struct Intruder {
    reads: Cell<usize>,
    callbacks: usize,
}

impl Entity for Intruder {
    fn entity_name(&self) -> &str {
        "Intruder"
    }

    fn field_value(&self, _field: &str) -> FieldValue<'_> {
        self.reads.set(self.reads.get() + 1);
        FieldValue::Set(Value::Int(1))
    }

    fn run_callback(&mut self, _name: &str) -> Result<()> {
        self.callbacks += 1;
        Ok(())
    }
}

#[test]
fn add_entity_of_other_type_is_rejected() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Book>(&conn).unwrap();

    let mut author = Author::new("Frank Herbert", "sci-fi");
    let err = bulk.add_entity(&mut author).unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::WrongEntity));
    assert_eq!(
        err.to_string(),
        "Bulk error: bulk session created for \"Book\", but \"Author\" added"
    );
    assert!(bulk.is_empty());
}

#[test]
fn wrong_entity_is_rejected_before_callbacks_or_reads() {
    let conn = MockConnection::new();
    // Magazine declares callbacks, so a late type check would run them.
    let mut bulk = BulkUpsert::for_entity::<Magazine>(&conn).unwrap();

    let mut intruder = Intruder::default();
    let err = bulk.add_entity(&mut intruder).unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::WrongEntity));
    assert_eq!(intruder.reads.get(), 0);
    assert_eq!(intruder.callbacks, 0);

    let err = bulk
        .add_entity_with_hint(&mut intruder, Some(true))
        .unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::WrongEntity));
    assert_eq!(intruder.reads.get(), 0);
    assert_eq!(intruder.callbacks, 0);
    assert!(bulk.is_empty());
}

#[test]
fn hashed_ids_are_deterministic() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Author>(&conn).unwrap();

    bulk.add_entities([
        &mut Author::new("full namez", "random stuff"),
        &mut Author::new("full namez", "random stuff"),
        &mut Author::new("full namez", "other stuff"),
    ])
    .unwrap();

    let ids: Vec<_> = bulk.pending().iter().map(|row| row.get("id").cloned()).collect();
    assert_eq!(ids[0], Some(Value::from("547sam5fc58t2t9s5byap2811")));
    assert_eq!(ids[0], ids[1]);
    assert_eq!(ids[2], Some(Value::from("25omrbh9b4cbvllp12gs1lwaq")));
}

#[test]
fn supplied_id_is_kept_when_queued() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Author>(&conn).unwrap();

    let mut author = Author::new("full namez", "random stuff");
    author.id = Some("manual".to_string());
    bulk.add_entity(&mut author).unwrap();
    assert_eq!(bulk.pending()[0].get("id"), Some(&Value::from("manual")));
}

#[test]
fn hashed_generator_needs_its_fields() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Author>(&conn).unwrap();

    // otherData is uninitialized and has no default.
    let mut author = Author {
        full_name: Some("full namez".to_string()),
        ..Author::default()
    };
    let err = bulk.add_entity(&mut author).unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::NoDefaultValue));

    let meta = Author::table_metadata().unwrap();
    let err = HashedIdGenerator
        .generate_bulk(&meta, &PendingRow::new().with("fullName", "x"))
        .unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::CannotGenerateId));
}

#[test]
fn sequence_generator_is_not_supported() {
    let err = TableMetadata::new("Book")
        .generator_strategy(GeneratorStrategy::Sequence("books_id_seq".to_string()))
        .unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::NotSupportedIdGenerator));
}

#[test]
fn join_column_reads_referenced_field() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Book>(&conn).unwrap();

    let mut with_author = Book {
        title: Some("Dune".to_string()),
        author: Some(Author {
            id: Some("547sam5fc58t2t9s5byap2811".to_string()),
            ..Author::new("full namez", "random stuff")
        }),
        ..Book::default()
    };
    let mut without_author = Book {
        title: Some("Anonymous".to_string()),
        pages: Some(12),
        ..Book::default()
    };
    bulk.add_entity(&mut with_author).unwrap();
    bulk.add_entity(&mut without_author).unwrap();

    let rows = bulk.pending();
    assert_eq!(
        rows[0],
        PendingRow::new()
            .with("id", Value::Null)
            .with("title", "Dune")
            .with("author", "547sam5fc58t2t9s5byap2811")
            .with("pages", 0_i32)
    );
    assert_eq!(rows[1].get("author"), Some(&Value::Null));
    assert_eq!(rows[1].get("pages"), Some(&Value::Int(12)));
}

#[test]
fn unsaved_related_entity_has_no_default() {
    let conn = MockConnection::new();
    let meta = Book::table_metadata().unwrap().join_column(
        ColumnMetadata::new("author", "author_id", SqlType::Char(25)),
        "fullName",
    );
    let mut bulk = BulkUpsert::new(&conn, meta);

    let mut book = Book {
        title: Some("Dune".to_string()),
        author: Some(Author::default()),
        ..Book::default()
    };
    let err = bulk.add_entity(&mut book).unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::NoDefaultValue));
}

#[test]
fn explicit_null_in_required_field_is_rejected() {
    let conn = MockConnection::new();
    let meta = Book::table_metadata()
        .unwrap()
        .column(ColumnMetadata::new("author", "author_id", SqlType::Char(25)).references("id"));
    let mut bulk = BulkUpsert::new(&conn, meta);

    let mut book = Book {
        title: Some("Dune".to_string()),
        ..Book::default()
    };
    let err = bulk.add_entity(&mut book).unwrap_err();
    assert_eq!(err.bulk_kind(), Some(BulkErrorKind::NullValue));
    assert!(err.to_string().contains("\"author\""));
}

#[test]
fn lifecycle_callbacks_stamp_timestamps() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Magazine>(&conn).unwrap();

    let mut fresh = Magazine::new(2022, 3, "Spring");
    let mut stored = Magazine {
        persisted: true,
        ..Magazine::new(2022, 2, "Winter")
    };
    bulk.add_entity(&mut fresh).unwrap();
    bulk.add_entity(&mut stored).unwrap();

    assert_eq!(fresh.created_at.as_deref(), Some(NOW));
    assert_eq!(fresh.updated_at, None);
    assert_eq!(stored.created_at, None);
    assert_eq!(stored.updated_at.as_deref(), Some(NOW));

    let rows = bulk.pending();
    assert_eq!(rows[0].get("createdAt"), Some(&Value::from(NOW)));
    assert_eq!(rows[0].get("updatedAt"), Some(&Value::Null));
    assert_eq!(rows[1].get("createdAt"), Some(&Value::Null));
}

struct NoTableYet;

impl EntityState for NoTableYet {
    fn is_new(&self, _entity: &dyn Entity) -> Result<bool> {
        Err(Error::Schema(SchemaError {
            kind: SchemaErrorKind::TableNotFound,
            message: "Table 'shop.magazines' doesn't exist".to_string(),
            source: None,
        }))
    }
}

struct BrokenState;

impl EntityState for BrokenState {
    fn is_new(&self, _entity: &dyn Entity) -> Result<bool> {
        Err(Error::Custom("state lookup failed".to_string()))
    }
}

#[test]
fn missing_table_means_new_entity() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Magazine>(&conn)
        .unwrap()
        .with_state(NoTableYet);

    let mut stored = Magazine {
        persisted: true,
        ..Magazine::new(2021, 12, "Holiday")
    };
    bulk.add_entity(&mut stored).unwrap();
    assert_eq!(stored.created_at.as_deref(), Some(NOW));
}

#[test]
fn other_state_errors_abort_the_row() {
    let conn = MockConnection::new();
    let mut bulk = BulkUpsert::for_entity::<Magazine>(&conn)
        .unwrap()
        .with_state(BrokenState);

    let err = bulk
        .add_entity(&mut Magazine::new(2021, 12, "Holiday"))
        .unwrap_err();
    assert_eq!(err.to_string(), "state lookup failed");
    assert!(bulk.is_empty());

    // A hint bypasses the state provider entirely.
    let mut magazine = Magazine::new(2021, 11, "Autumn");
    bulk.add_entity_with_hint(&mut magazine, Some(false)).unwrap();
    assert_eq!(magazine.updated_at.as_deref(), Some(NOW));
}

//! Client-side identifier generation.
//!
//! A table may configure one [`IdGenerator`]. Bulk sessions call it for
//! every identifier field that is still NULL once a row is assembled, and
//! again for every identifier parameter when the chunk is bound.

use crate::Result;
use crate::error::BulkError;
use crate::metadata::TableMetadata;
use crate::row::PendingRow;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Width of a hashed identifier: 128 bits need 25 base-36 digits.
pub const HASHED_ID_LEN: usize = 25;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Strategy producing a value for an identifier column.
///
/// Implementations must be callable once per row and must not expect the
/// row to already hold its final identifier.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Produce the identifier for `row`, a row of `metadata`'s entity type.
    fn generate_bulk(&self, metadata: &TableMetadata, row: &PendingRow) -> Result<Value>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Deterministic generator hashing the entity's declared hash fields.
///
/// Two rows with identical values in those fields always get the same
/// identifier, which gives composite natural keys a stable surrogate id.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedIdGenerator;

impl IdGenerator for HashedIdGenerator {
    fn generate_bulk(&self, metadata: &TableMetadata, row: &PendingRow) -> Result<Value> {
        let Some(fields) = metadata.hashed_id_fields_list() else {
            return Err(BulkError::entity_not_supported(metadata.entity()).into());
        };

        let mut parts = Vec::with_capacity(fields.len());
        for field in fields {
            match row.get(field) {
                Some(value) => parts.push(value.clone()),
                None => return Err(BulkError::cannot_generate_id(metadata.entity(), field).into()),
            }
        }

        Ok(Value::Text(simple_hash(&parts)))
    }

    fn name(&self) -> &str {
        "hashed"
    }
}

/// Hash values into a fixed-width base-36 identifier.
///
/// The values are rendered as plain text, joined with `_`, digested with
/// MD5, and the hex digest is re-encoded in base 36, left-padded with `0`
/// to [`HASHED_ID_LEN`] characters.
pub fn simple_hash(values: &[Value]) -> String {
    let joined = values
        .iter()
        .map(Value::to_plain_string)
        .collect::<Vec<_>>()
        .join("_");
    let digest = md5::compute(joined.as_bytes());
    to_base36(u128::from_be_bytes(digest.0))
}

fn to_base36(mut n: u128) -> String {
    let mut buf = [b'0'; HASHED_ID_LEN];
    let mut pos = HASHED_ID_LEN;
    while n > 0 {
        pos -= 1;
        buf[pos] = BASE36_DIGITS[(n % 36) as usize];
        n /= 36;
    }
    buf.iter().map(|&b| char::from(b)).collect()
}

/// How a table's identifiers come to exist, as declared by its mapping.
#[derive(Debug, Clone, Default)]
pub enum GeneratorStrategy {
    /// Identifiers are always supplied by the caller.
    #[default]
    None,
    /// The database assigns identifiers (auto increment); the session
    /// reports the last inserted id.
    Identity,
    /// [`HashedIdGenerator`].
    Hashed,
    /// A database sequence. Needs one round trip per row, so bulk
    /// sessions reject it.
    Sequence(String),
    /// Any other client-side generator.
    Custom(Arc<dyn IdGenerator>),
}

impl GeneratorStrategy {
    /// Resolve the strategy into the generator a bulk session runs.
    ///
    /// `Ok(None)` means no client-side generation happens.
    pub fn into_generator(self, entity: &str) -> Result<Option<Arc<dyn IdGenerator>>> {
        match self {
            GeneratorStrategy::None | GeneratorStrategy::Identity => Ok(None),
            GeneratorStrategy::Hashed => Ok(Some(Arc::new(HashedIdGenerator))),
            GeneratorStrategy::Sequence(name) => Err(BulkError::not_supported_id_generator(
                entity,
                &format!("sequence:{name}"),
            )
            .into()),
            GeneratorStrategy::Custom(generator) => Ok(Some(generator)),
        }
    }
}

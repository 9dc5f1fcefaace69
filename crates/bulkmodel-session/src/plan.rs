//! Batch planning: duplicate removal and chunking of queued rows.

use bulkmodel_core::{Error, PendingRow, Result};
use std::collections::HashMap;

/// Rows per statement when the caller does not say otherwise.
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Separator between values in a row's duplicate-detection key.
const DEDUP_KEY_SEPARATOR: &str = ".";

/// Reject a chunk size that cannot make progress.
pub fn validate_max_rows(max_rows: usize) -> Result<()> {
    if max_rows < 1 {
        return Err(Error::InvalidArgument(
            "maxRows has to be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Collapse rows whose values render to the same key.
///
/// The key is every value as plain text, in row order, joined with `.`.
/// For a repeated key the content of the *last* occurrence is kept, at the
/// position of the *first* occurrence. Returns the surviving rows and how
/// many were dropped.
pub fn deduplicate(rows: Vec<PendingRow>) -> (Vec<PendingRow>, usize) {
    let total = rows.len();
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(total);
    let mut kept: Vec<PendingRow> = Vec::with_capacity(total);

    for row in rows {
        let key = row.joined_values(DEDUP_KEY_SEPARATOR);
        match positions.get(&key) {
            Some(&idx) => kept[idx] = row,
            None => {
                positions.insert(key, kept.len());
                kept.push(row);
            }
        }
    }

    let dropped = total - kept.len();
    (kept, dropped)
}

/// Split rows into consecutive chunks of at most `max_rows`, in order.
pub fn chunk(rows: &[PendingRow], max_rows: usize) -> Result<std::slice::Chunks<'_, PendingRow>> {
    validate_max_rows(max_rows)?;
    Ok(rows.chunks(max_rows))
}

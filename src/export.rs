// src/export.rs
use anyhow::{Context, Result};

use crate::storage::csv_store::encode_rows;
use crate::types::TableRecord;

/// Render records as downloadable CSV: header row, UTF-8, one record per line
pub fn to_csv<R: TableRecord>(records: &[R]) -> Result<String> {
    let header = R::headers().iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let rows = std::iter::once(header).chain(records.iter().map(R::to_row));

    let bytes = encode_rows(rows)?;
    String::from_utf8(bytes).context("Exported CSV is not valid UTF-8")
}

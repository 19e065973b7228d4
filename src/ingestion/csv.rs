//! CSV ingestion implementation.

use std::path::Path;

use crate::error::{IngestionError, IngestionResult};

use super::records::{Located, Record};

/// Read CSV records of type `R` from a file.
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain every column in [`Record::COLUMNS`] (order can differ).
/// - Each value is parsed according to the record field type.
pub fn read_csv_records_from_path<R: Record>(path: impl AsRef<Path>) -> IngestionResult<Vec<Located<R>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    read_csv_records_from_reader(&mut rdr)
}

/// Read CSV records from an existing CSV reader.
pub fn read_csv_records_from_reader<R: Record, Rd: std::io::Read>(
    rdr: &mut csv::Reader<Rd>,
) -> IngestionResult<Vec<Located<R>>> {
    let headers = rdr.headers()?.clone();

    for column in R::COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(IngestionError::SchemaMismatch {
                message: format!(
                    "missing required {} column '{column}'. headers={:?}",
                    R::ENTITY,
                    headers.iter().collect::<Vec<_>>(),
                ),
            });
        }
    }

    let mut rows = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;

        let parsed = record.deserialize::<R>(Some(&headers)).map_err(|e| {
            let field = match e.kind() {
                csv::ErrorKind::Deserialize { err, .. } => err.field().map(|f| f as usize),
                _ => None,
            };
            match field {
                Some(idx) => IngestionError::ParseError {
                    row: user_row,
                    column: headers.get(idx).unwrap_or("?").to_string(),
                    raw: record.get(idx).unwrap_or("").to_string(),
                    message: e.to_string(),
                },
                None => IngestionError::Csv(e),
            }
        })?;
        rows.push((user_row, parsed));
    }

    Ok(rows)
}

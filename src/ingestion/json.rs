//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"id":1, ...}, {"id":2, ...}]`
//! - A single object: `{"id":1, ...}`
//! - Newline-delimited JSON (NDJSON): `{"id":1, ...}\n{"id":2, ...}\n`

use std::fs;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};

use super::records::{Located, Record};

/// Read JSON records of type `R` from a file.
pub fn read_json_records_from_path<R: Record>(path: impl AsRef<Path>) -> IngestionResult<Vec<Located<R>>> {
    let text = fs::read_to_string(path)?;
    read_json_records_from_str(&text)
}

/// Read JSON records of type `R` from an in-memory string.
///
/// Rows are numbered from 1 in input order.
pub fn read_json_records_from_str<R: Record>(input: &str) -> IngestionResult<Vec<Located<R>>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: format!("{} json input is empty", R::ENTITY),
        });
    }

    // First try parsing as a single JSON value (array or object).
    let values = if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(_) => vec![v],
            _ => {
                return Err(IngestionError::SchemaMismatch {
                    message: "json must be an object, an array of objects, or NDJSON".to_string(),
                });
            }
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
                IngestionError::SchemaMismatch {
                    message: format!("invalid ndjson at line {}: {}", i + 1, e),
                }
            })?;
            values.push(v);
        }
        values
    };

    values
        .into_iter()
        .enumerate()
        .map(|(idx0, v)| {
            let row = idx0 + 1;
            if !v.is_object() {
                return Err(IngestionError::SchemaMismatch {
                    message: format!("{} row {row} is not a json object", R::ENTITY),
                });
            }
            let record = serde_json::from_value::<R>(v).map_err(|e| IngestionError::SchemaMismatch {
                message: format!("{} row {row}: {e}", R::ENTITY),
            })?;
            Ok((row, record))
        })
        .collect()
}

use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for queries and reports.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error type returned while loading entity snapshots from files.
///
/// A single error enum shared across CSV and JSON ingestion and reference resolution.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON ingestion error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input does not conform to the expected record shape (missing columns, wrong layout).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed or violates an entity invariant.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// An order refers to a customer or product that is not part of the load.
    #[error("unresolved reference in {entity} {id}: {message}")]
    UnresolvedReference {
        entity: &'static str,
        id: i64,
        message: String,
    },

    /// Two records of the same collection share an id.
    #[error("duplicate {entity} id {id}")]
    DuplicateId { entity: &'static str, id: i64 },
}

/// Error type returned by query construction, reports and the execution engine.
///
/// Empty aggregations are not errors; they surface as `None`. Errors raised by caller-supplied
/// functions in the `try_*` pipeline operations are returned as-is and never wrapped here.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed query parameter or entity value.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The data source failed to produce a snapshot.
    #[error("data source error: {0}")]
    Source(#[from] IngestionError),

    /// The parallel execution pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl QueryError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

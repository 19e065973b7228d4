//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`load_catalog`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`IngestionOptions`])
//! - resolves order references against the loaded customers and products
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific readers are also available under:
//! - [`csv`]
//! - [`json`]

pub mod csv;
pub mod json;
pub mod observability;
pub mod records;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver,
};
pub use records::References;
pub use unified::{
    CatalogPaths, IngestionFormat, IngestionOptions, load_catalog, load_customers, load_orders, load_products,
};

//! Unified ingestion entrypoint.
//!
//! Most callers should use [`load_catalog`], which loads the three entity files named by
//! [`CatalogPaths`] into a validated [`Catalog`].
//!
//! - If [`IngestionOptions::format`] is `None`, the ingestion format of each file is inferred from
//!   its extension.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it once per file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Catalog, Customer, Order, Product};

use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::records::{
    CsvOrderRecord, CustomerRecord, Located, OrderRecord, ProductRecord, Record, References, ensure_unique_ids,
};
use super::{csv, json};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Locations of the three entity files making up a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    pub customers: PathBuf,
    pub products: PathBuf,
    pub orders: PathBuf,
}

impl CatalogPaths {
    /// `customers.<ext>`, `products.<ext>` and `orders.<ext>` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, ext: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            customers: dir.join(format!("customers.{ext}")),
            products: dir.join(format!("products.{ext}")),
            orders: dir.join(format!("orders.{ext}")),
        }
    }
}

/// Load customers, products and orders and assemble them into a [`Catalog`].
///
/// Files are loaded in dependency order; the first failure stops the load.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use retail_query::ingestion::{load_catalog, CatalogPaths, IngestionOptions, StdErrObserver};
///
/// # fn main() -> Result<(), retail_query::IngestionError> {
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(StdErrObserver)),
///     ..Default::default()
/// };
/// let catalog = load_catalog(&CatalogPaths::in_dir("data", "json"), &opts)?;
/// println!("orders={}", catalog.orders().len());
/// # Ok(())
/// # }
/// ```
pub fn load_catalog(paths: &CatalogPaths, options: &IngestionOptions) -> IngestionResult<Catalog> {
    let customers = load_customers(&paths.customers, options)?;
    let products = load_products(&paths.products, options)?;
    let references = References::new(&customers, &products)?;
    let orders = load_orders(&paths.orders, &references, options)?;

    Catalog::new(customers, products, orders).map_err(|e| IngestionError::SchemaMismatch {
        message: format!("catalog rejected: {e}"),
    })
}

/// Load the customer collection from `path`.
pub fn load_customers(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<Vec<Customer>> {
    load_entities(path.as_ref(), options, CustomerRecord::ENTITY, |format, path| {
        let rows = read_records::<CustomerRecord>(format, path)?;
        ensure_unique_ids(CustomerRecord::ENTITY, &rows, |r| r.id)?;
        Ok(rows.into_iter().map(|(_, r)| r.into_customer()).collect())
    })
}

/// Load the product collection from `path`, validating category and price.
pub fn load_products(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<Vec<Product>> {
    load_entities(path.as_ref(), options, ProductRecord::ENTITY, |format, path| {
        let rows = read_records::<ProductRecord>(format, path)?;
        ensure_unique_ids(ProductRecord::ENTITY, &rows, |r| r.id)?;
        rows.into_iter().map(|(row, r)| r.into_product(row)).collect()
    })
}

/// Load the order collection from `path`, resolving customer and product ids via `references`.
pub fn load_orders(
    path: impl AsRef<Path>,
    references: &References,
    options: &IngestionOptions,
) -> IngestionResult<Vec<Order>> {
    load_entities(path.as_ref(), options, OrderRecord::ENTITY, |format, path| {
        let rows: Vec<Located<OrderRecord>> = match format {
            IngestionFormat::Json => json::read_json_records_from_path::<OrderRecord>(path)?,
            IngestionFormat::Csv => csv::read_csv_records_from_path::<CsvOrderRecord>(path)?
                .into_iter()
                .map(|(row, r)| r.into_order_record(row).map(|rec| (row, rec)))
                .collect::<IngestionResult<_>>()?,
        };
        ensure_unique_ids(OrderRecord::ENTITY, &rows, |r| r.id)?;
        rows.into_iter()
            .map(|(row, r)| references.resolve(row, r))
            .collect()
    })
}

fn read_records<R: Record>(format: IngestionFormat, path: &Path) -> IngestionResult<Vec<Located<R>>> {
    match format {
        IngestionFormat::Csv => csv::read_csv_records_from_path(path),
        IngestionFormat::Json => json::read_json_records_from_path(path),
    }
}

/// Resolve the format, run `load`, and report the outcome to the configured observer.
fn load_entities<T>(
    path: &Path,
    options: &IngestionOptions,
    entity: &'static str,
    load: impl FnOnce(IngestionFormat, &Path) -> IngestionResult<Vec<T>>,
) -> IngestionResult<Vec<T>> {
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format: fmt,
        entity,
    };

    let result = load(fmt, path);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(items) => obs.on_success(&ctx, IngestionStats { rows: items.len() }),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::Json(err) if err.is_io() => IngestionSeverity::Critical,
        IngestionError::Json(_)
        | IngestionError::SchemaMismatch { .. }
        | IngestionError::ParseError { .. }
        | IngestionError::UnresolvedReference { .. }
        | IngestionError::DuplicateId { .. } => IngestionSeverity::Error,
    }
}

fn infer_format_from_path(path: &Path) -> IngestionResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| IngestionError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

//! Data source adapters supplying entity snapshots to reports.
//!
//! Every call returns a fresh, immutable [`Snapshot`]. Any resource a source needs (files, for
//! [`FileSource`]) is acquired and released inside the call.

use std::sync::Arc;

use crate::error::QueryResult;
use crate::ingestion::{CatalogPaths, IngestionOptions, load_catalog};
use crate::types::{Catalog, Customer, Order, Product, Snapshot};

/// Supplier of customer, order and product snapshots.
pub trait DataSource: Send + Sync {
    fn find_all_customers(&self) -> QueryResult<Snapshot<Customer>>;

    fn find_all_orders(&self) -> QueryResult<Snapshot<Order>>;

    fn find_all_products(&self) -> QueryResult<Snapshot<Product>>;
}

impl DataSource for Catalog {
    fn find_all_customers(&self) -> QueryResult<Snapshot<Customer>> {
        Ok(Arc::clone(self.customers()))
    }

    fn find_all_orders(&self) -> QueryResult<Snapshot<Order>> {
        Ok(Arc::clone(self.orders()))
    }

    fn find_all_products(&self) -> QueryResult<Snapshot<Product>> {
        Ok(Arc::clone(self.products()))
    }
}

impl<S: DataSource + ?Sized> DataSource for &S {
    fn find_all_customers(&self) -> QueryResult<Snapshot<Customer>> {
        (**self).find_all_customers()
    }

    fn find_all_orders(&self) -> QueryResult<Snapshot<Order>> {
        (**self).find_all_orders()
    }

    fn find_all_products(&self) -> QueryResult<Snapshot<Product>> {
        (**self).find_all_products()
    }
}

impl<S: DataSource + ?Sized> DataSource for Arc<S> {
    fn find_all_customers(&self) -> QueryResult<Snapshot<Customer>> {
        (**self).find_all_customers()
    }

    fn find_all_orders(&self) -> QueryResult<Snapshot<Order>> {
        (**self).find_all_orders()
    }

    fn find_all_products(&self) -> QueryResult<Snapshot<Product>> {
        (**self).find_all_products()
    }
}

/// Reads the three entity files on every call.
///
/// Each `find_all_*` loads and validates a complete [`Catalog`] so that orders always resolve
/// against the customers and products on disk at that moment. Failures surface as
/// [`crate::QueryError::Source`].
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: CatalogPaths,
    options: IngestionOptions,
}

impl FileSource {
    pub fn new(paths: CatalogPaths, options: IngestionOptions) -> Self {
        Self { paths, options }
    }

    pub fn paths(&self) -> &CatalogPaths {
        &self.paths
    }

    /// Load a fresh catalog from disk.
    pub fn load(&self) -> QueryResult<Catalog> {
        Ok(load_catalog(&self.paths, &self.options)?)
    }
}

impl DataSource for FileSource {
    fn find_all_customers(&self) -> QueryResult<Snapshot<Customer>> {
        Ok(Arc::clone(self.load()?.customers()))
    }

    fn find_all_orders(&self) -> QueryResult<Snapshot<Order>> {
        Ok(Arc::clone(self.load()?.orders()))
    }

    fn find_all_products(&self) -> QueryResult<Snapshot<Product>> {
        Ok(Arc::clone(self.load()?.products()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::{DataSource, FileSource};
    use crate::error::QueryError;
    use crate::ingestion::{CatalogPaths, IngestionOptions};
    use crate::types::{Catalog, Customer, Order, Product};

    fn catalog() -> Catalog {
        let ada = Customer::new(1, "Ada", 1);
        let dune = Product::new(1, "Dune", "Books", 10.0).unwrap();
        let order = Order::new(
            1,
            NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
            ada.clone(),
            vec![dune.clone()],
        );
        Catalog::new(vec![ada], vec![dune], vec![order]).unwrap()
    }

    fn counts(source: &impl DataSource) -> (usize, usize, usize) {
        (
            source.find_all_customers().unwrap().len(),
            source.find_all_products().unwrap().len(),
            source.find_all_orders().unwrap().len(),
        )
    }

    #[test]
    fn catalog_and_wrappers_share_snapshots() {
        let catalog = catalog();
        assert_eq!(counts(&catalog), (1, 1, 1));
        assert_eq!(counts(&&catalog), (1, 1, 1));

        let shared = Arc::new(catalog);
        assert_eq!(counts(&shared), (1, 1, 1));
        assert!(Arc::ptr_eq(
            &shared.find_all_orders().unwrap(),
            &shared.find_all_orders().unwrap()
        ));
    }

    #[test]
    fn missing_files_surface_as_source_errors() {
        let source = FileSource::new(
            CatalogPaths::in_dir("does/not/exist", "json"),
            IngestionOptions::default(),
        );
        let err = source.find_all_products().unwrap_err();
        assert!(matches!(err, QueryError::Source(_)));
    }
}

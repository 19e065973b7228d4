//! `retail-query` is a small in-memory query engine over customers, orders and products.
//!
//! Data arrives as immutable snapshots from a [`source::DataSource`]: either an in-memory
//! [`types::Catalog`] or a [`source::FileSource`] that loads CSV/JSON files through
//! [`ingestion::load_catalog`]. Queries are built from three layers:
//!
//! - [`predicate`]: composable, short-circuiting boolean tests (`category_equals`, `price_above`,
//!   `tier_equals`, date windows, ...)
//! - [`processing`]: order-preserving sequence primitives (filter/map/flat-map join/distinct,
//!   stable sort and top-k, group-by, reduce, summary statistics)
//! - [`reports`]: named aggregation queries composed from the two layers above
//!
//! [`execution::ExecutionEngine`] runs the same primitives in parallel on a rayon pool, with
//! throttling, metrics and observer hooks.
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension):**
//!
//! - **CSV**: `.csv` (headers required, columns in any order; order `product_ids` are `;`-separated)
//! - **JSON**: `.json` (array-of-objects or a single object) and `.ndjson` (newline-delimited objects)
//!
//! ## Quick example: load and query
//!
//! ```no_run
//! use retail_query::ingestion::{CatalogPaths, IngestionOptions};
//! use retail_query::reports::Reports;
//! use retail_query::source::FileSource;
//!
//! # fn main() -> Result<(), retail_query::QueryError> {
//! let source = FileSource::new(CatalogPaths::in_dir("data", "json"), IngestionOptions::default());
//! let reports = Reports::new(source);
//! for product in reports.cheapest_in_category_top_k("Books", 3)? {
//!     println!("{} {}", product.name(), product.price());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Processing example
//!
//! ```rust
//! use retail_query::predicate::{category_equals, price_above};
//! use retail_query::processing::{filter, top_k, Direction};
//! use retail_query::types::Product;
//!
//! let products = vec![
//!     Product::new(1, "Dune", "Books", 150.0).unwrap(),
//!     Product::new(2, "Emma", "Books", 80.0).unwrap(),
//!     Product::new(3, "Kite", "Toys", 20.0).unwrap(),
//! ];
//!
//! let pricey_books: Vec<&Product> =
//!     filter(&products, &category_equals("books").and(price_above(100.0))).collect();
//! assert_eq!(pricey_books.len(), 1);
//!
//! let cheapest = top_k(filter(&products, &category_equals("Books")), |p| p.price(), 1, Direction::Ascending);
//! assert_eq!(cheapest[0].name(), "Emma");
//! ```
//!
//! ## Modules
//!
//! - [`types`]: entities, ids and the [`types::Catalog`] snapshot bundle
//! - [`ingestion`]: file loaders and ingestion observers
//! - [`source`]: the data source adapter trait and its implementations
//! - [`execution`]: parallel execution engine
//! - [`error`]: error types

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod predicate;
pub mod processing;
pub mod reports;
pub mod source;
pub mod types;

pub use error::{IngestionError, IngestionResult, QueryError, QueryResult};
pub use reports::Reports;
pub use source::{DataSource, FileSource};

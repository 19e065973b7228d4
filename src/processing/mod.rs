//! Sequence transformations over entity snapshots.
//!
//! Every operation is a free function over `IntoIterator`, so it accepts owned vectors,
//! snapshot iterators (`snapshot.iter()`) or the output of another operation. Lazy operations
//! return iterators; operations that must see the whole input (sort, top-k, group, fold,
//! statistics) return materialized values.
//!
//! Currently implemented:
//!
//! - [`filter()`], [`map()`], [`flat_map_join()`], [`distinct()`]: lazy and order-preserving
//! - [`sort_by()`], [`top_k()`], [`limit()`]: stable ordering and truncation
//! - [`group_by()`], [`group_by_mapped()`], [`group_by_reduce()`]: partitioning by key
//! - [`reduce()`], [`reduce_with()`] and [`Reducer`]: folding
//! - [`summary_statistics()`]: count/sum/min/max/average
//!
//! Fallible variants (`try_*`) take functions returning `Result<_, E>` and hand the first error
//! back unchanged.
//!
//! ## Example: filter → join → distinct → sum
//!
//! ```rust
//! use chrono::NaiveDate;
//! use retail_query::predicate::{date_in, DateRange};
//! use retail_query::processing::{distinct, filter, flat_map_join, summary_statistics};
//! use retail_query::types::{Customer, Order, Product};
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2021, m, day).unwrap();
//! let book = Product::new(1, "Dune", "Books", 100.0).unwrap();
//! let toy = Product::new(2, "Kite", "Toys", 50.0).unwrap();
//! let ada = Customer::new(1, "Ada", 2);
//! let orders = vec![
//!     Order::new(10, d(2, 3), ada.clone(), vec![book.clone(), toy.clone()]),
//!     Order::new(11, d(3, 1), ada, vec![book]),
//! ];
//!
//! let february = date_in(DateRange::month(2021, 2).unwrap());
//! let spent = summary_statistics(
//!     distinct(flat_map_join(filter(orders.iter(), &february), |o| o.products())),
//!     |p| p.price(),
//! );
//! assert_eq!(spent.sum, 150.0);
//! ```

pub mod filter;
pub mod group;
pub mod join;
pub mod map;
pub mod reduce;
pub mod sort;
pub mod stats;

pub use filter::{filter, try_filter};
pub use group::{group_by, group_by_mapped, group_by_reduce, try_group_by};
pub use join::{distinct, flat_map_join};
pub use map::{map, try_map};
pub use reduce::{reduce, reduce_with, try_reduce, Reducer};
pub use sort::{limit, sort_by, top_k, try_sort_by, try_top_k, Direction};
pub use stats::{summary_statistics, try_summary_statistics, SummaryStatistics};

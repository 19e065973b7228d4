//! Named queries composed from the pipeline primitives.
//!
//! [`Reports`] owns no state beyond its data source: every method pulls fresh snapshots, runs a
//! small pipeline and returns an owned result. Aggregations over empty groups come back as
//! `None` rather than as errors.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use retail_query::reports::Reports;
//! use retail_query::types::{Catalog, Customer, Order, Product};
//!
//! # fn main() -> Result<(), retail_query::QueryError> {
//! let ada = Customer::new(1, "Ada", 2);
//! let dune = Product::new(1, "Dune", "Books", 150.0)?;
//! let emma = Product::new(2, "Emma", "Books", 80.0)?;
//! let date = NaiveDate::from_ymd_opt(2021, 2, 3).unwrap();
//! let order = Order::new(10, date, ada.clone(), vec![dune.clone(), emma.clone()]);
//! let reports = Reports::new(Catalog::new(vec![ada], vec![dune, emma], vec![order])?);
//!
//! assert_eq!(reports.total_spend_in_month(2021, 2)?, 230.0);
//! assert_eq!(reports.cheapest_in_category("books")?.map(|p| p.name().to_string()), Some("Emma".into()));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;

use crate::error::{QueryError, QueryResult};
use crate::execution::{ExecutionEvent, ExecutionObserver};
use crate::predicate::{
    DateRange, Predicate, category_equals, contains_product, date_in, placed_by, placed_on, price_above,
    tier_equals,
};
use crate::processing::{
    Direction, Reducer, SummaryStatistics, distinct, filter, flat_map_join, group_by, group_by_mapped,
    group_by_reduce, map, reduce_with, summary_statistics, top_k, try_map,
};
use crate::source::DataSource;
use crate::types::{Category, Customer, CustomerId, Order, OrderId, Product};

/// Size of a report result, as reported in [`ExecutionEvent::ReportFinished`].
pub trait ReportOutput {
    fn rows(&self) -> usize;
}

impl<T> ReportOutput for Vec<T> {
    fn rows(&self) -> usize {
        self.len()
    }
}

impl<K, V, H> ReportOutput for HashMap<K, V, H> {
    fn rows(&self) -> usize {
        self.len()
    }
}

impl<T> ReportOutput for Option<T> {
    fn rows(&self) -> usize {
        usize::from(self.is_some())
    }
}

impl ReportOutput for f64 {
    fn rows(&self) -> usize {
        1
    }
}

impl ReportOutput for SummaryStatistics {
    fn rows(&self) -> usize {
        1
    }
}

/// Aggregation reports over a [`DataSource`].
pub struct Reports<S> {
    source: S,
    observer: Option<Arc<dyn ExecutionObserver>>,
}

impl<S: DataSource> Reports<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            observer: None,
        }
    }

    /// Report start/finish events (with timing) to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn all_customers(&self) -> QueryResult<Vec<Customer>> {
        self.observe("all_customers", || Ok(self.source.find_all_customers()?.to_vec()))
    }

    pub fn all_products(&self) -> QueryResult<Vec<Product>> {
        self.observe("all_products", || Ok(self.source.find_all_products()?.to_vec()))
    }

    pub fn all_orders(&self) -> QueryResult<Vec<Order>> {
        self.observe("all_orders", || Ok(self.source.find_all_orders()?.to_vec()))
    }

    /// Products of `category` priced strictly above `threshold`, in source order.
    pub fn products_in_category_above(&self, category: &str, threshold: f64) -> QueryResult<Vec<Product>> {
        self.observe("products_in_category_above", || {
            let wanted = in_category(category)?.and(price_above(threshold));
            let products = self.source.find_all_products()?;
            Ok(filter(products.iter(), &wanted).cloned().collect())
        })
    }

    /// Orders with at least one product of `category`.
    pub fn orders_containing_category(&self, category: &str) -> QueryResult<Vec<Order>> {
        self.observe("orders_containing_category", || {
            let wanted = contains_product(in_category(category)?);
            let orders = self.source.find_all_orders()?;
            Ok(filter(orders.iter(), &wanted).cloned().collect())
        })
    }

    /// Products of `category` re-priced at `price * (1 - discount)`.
    ///
    /// `discount` must lie in `[0, 1]`. The snapshot products keep their original price.
    pub fn discounted_products(&self, category: &str, discount: f64) -> QueryResult<Vec<Product>> {
        self.observe("discounted_products", || {
            if !(0.0..=1.0).contains(&discount) {
                return Err(QueryError::invalid(format!(
                    "discount must be within [0, 1], got {discount}"
                )));
            }
            let wanted = in_category(category)?;
            let products = self.source.find_all_products()?;
            try_map(filter(products.iter(), &wanted), |p| {
                p.with_price(p.price() * (1.0 - discount))
            })
        })
    }

    /// Distinct products ordered by customers of `tier` within `window`.
    pub fn products_by_tier_between(&self, tier: u8, window: DateRange) -> QueryResult<Vec<Product>> {
        self.observe("products_by_tier_between", || {
            let wanted = placed_by(tier_equals(tier)).and(date_in(window));
            self.distinct_products_of(&wanted)
        })
    }

    pub fn cheapest_in_category(&self, category: &str) -> QueryResult<Option<Product>> {
        self.observe("cheapest_in_category", || {
            self.pick_in_category(category, &Reducer::min_by(Product::price))
        })
    }

    pub fn most_expensive_in_category(&self, category: &str) -> QueryResult<Option<Product>> {
        self.observe("most_expensive_in_category", || {
            self.pick_in_category(category, &Reducer::max_by(Product::price))
        })
    }

    /// Cheapest product of every category present in the snapshot. Ties keep the earlier product.
    pub fn cheapest_per_category(&self) -> QueryResult<HashMap<Category, Option<Product>>> {
        self.observe("cheapest_per_category", || {
            self.pick_per_category(&Reducer::min_by(Product::price))
        })
    }

    pub fn most_expensive_per_category(&self) -> QueryResult<HashMap<Category, Option<Product>>> {
        self.observe("most_expensive_per_category", || {
            self.pick_per_category(&Reducer::max_by(Product::price))
        })
    }

    /// Up to `k` products of `category`, cheapest first. `k <= 0` yields nothing.
    pub fn cheapest_in_category_top_k(&self, category: &str, k: i64) -> QueryResult<Vec<Product>> {
        self.observe("cheapest_in_category_top_k", || {
            self.top_k_in_category(category, k, Direction::Ascending)
        })
    }

    pub fn most_expensive_in_category_top_k(&self, category: &str, k: i64) -> QueryResult<Vec<Product>> {
        self.observe("most_expensive_in_category_top_k", || {
            self.top_k_in_category(category, k, Direction::Descending)
        })
    }

    /// The `n` latest orders, newest first. Orders on the same date keep snapshot order.
    pub fn most_recent_orders(&self, n: i64) -> QueryResult<Vec<Order>> {
        self.observe("most_recent_orders", || {
            let orders = self.source.find_all_orders()?;
            let latest = top_k(orders.iter(), |o| o.order_date(), n, Direction::Descending);
            Ok(latest.into_iter().cloned().collect())
        })
    }

    /// Distinct products of the orders placed on `date`, in first-seen order.
    pub fn products_ordered_on(&self, date: NaiveDate) -> QueryResult<Vec<Product>> {
        self.observe("products_ordered_on", || self.distinct_products_of(&placed_on(date)))
    }

    /// Sum of product prices over orders placed in the given calendar month.
    pub fn total_spend_in_month(&self, year: i32, month: u32) -> QueryResult<f64> {
        self.observe("total_spend_in_month", || {
            let window = DateRange::month(year, month)?;
            Ok(self.spend(&date_in(window))?.sum)
        })
    }

    /// Sum of product prices over orders placed within `window`.
    pub fn total_spend_between(&self, window: DateRange) -> QueryResult<f64> {
        self.observe("total_spend_between", || {
            let orders = self.source.find_all_orders()?;
            let prices = flat_map_join(filter(orders.iter(), &date_in(window)), |o| o.products().iter());
            Ok(reduce_with(prices, &Reducer::sum_by(Product::price)))
        })
    }

    /// Average product price over orders placed in the month; `None` when nothing was bought.
    pub fn average_spend_in_month(&self, year: i32, month: u32) -> QueryResult<Option<f64>> {
        self.observe("average_spend_in_month", || {
            let window = DateRange::month(year, month)?;
            Ok(self.spend(&date_in(window))?.average())
        })
    }

    pub fn average_spend_on(&self, date: NaiveDate) -> QueryResult<Option<f64>> {
        self.observe("average_spend_on", || Ok(self.spend(&placed_on(date))?.average()))
    }

    /// Price statistics over the products of `category`.
    pub fn category_price_statistics(&self, category: &str) -> QueryResult<SummaryStatistics> {
        self.observe("category_price_statistics", || {
            let wanted = in_category(category)?;
            let products = self.source.find_all_products()?;
            Ok(summary_statistics(filter(products.iter(), &wanted), Product::price))
        })
    }

    /// Number of products in every order, keyed by order id. Orders without products map to 0.
    pub fn product_counts_by_order(&self) -> QueryResult<HashMap<OrderId, usize>> {
        self.observe("product_counts_by_order", || {
            let orders = self.source.find_all_orders()?;
            Ok(map(orders.iter(), |o| (o.id(), o.products().len())).collect())
        })
    }

    /// Orders grouped by customer, each group in snapshot order.
    pub fn orders_by_customer(&self) -> QueryResult<HashMap<Customer, Vec<Order>>> {
        self.observe("orders_by_customer", || {
            let orders = self.source.find_all_orders()?;
            Ok(group_by(orders.iter().cloned(), |o| o.customer().clone()))
        })
    }

    pub fn order_ids_by_customer_id(&self) -> QueryResult<HashMap<CustomerId, Vec<OrderId>>> {
        self.observe("order_ids_by_customer_id", || {
            let orders = self.source.find_all_orders()?;
            Ok(group_by_mapped(orders.iter(), |o| o.customer().id(), |o| o.id()))
        })
    }

    /// Total product price of every order.
    pub fn order_totals(&self) -> QueryResult<HashMap<Order, f64>> {
        self.observe("order_totals", || {
            let orders = self.source.find_all_orders()?;
            let total = Reducer::sum_by(Product::price);
            Ok(map(orders.iter(), |o| (o.clone(), reduce_with(o.products(), &total))).collect())
        })
    }

    pub fn order_totals_by_id(&self) -> QueryResult<HashMap<OrderId, f64>> {
        self.observe("order_totals_by_id", || {
            let orders = self.source.find_all_orders()?;
            let total = Reducer::sum_by(Product::price);
            Ok(map(orders.iter(), |o| (o.id(), reduce_with(o.products(), &total))).collect())
        })
    }

    /// Product names per category, in snapshot order.
    pub fn product_names_by_category(&self) -> QueryResult<HashMap<Category, Vec<String>>> {
        self.observe("product_names_by_category", || {
            let products = self.source.find_all_products()?;
            Ok(group_by_mapped(
                products.iter(),
                |p| p.category().clone(),
                |p| p.name().to_string(),
            ))
        })
    }

    /// Name of the most expensive product per category. `None` is distinct from an empty name.
    pub fn most_expensive_name_by_category(&self) -> QueryResult<HashMap<Category, Option<String>>> {
        self.observe("most_expensive_name_by_category", || {
            let picked = self.pick_per_category(&Reducer::max_by(Product::price))?;
            Ok(picked
                .into_iter()
                .map(|(category, product)| (category, product.map(|p| p.name().to_string())))
                .collect())
        })
    }

    fn pick_in_category(
        &self,
        category: &str,
        reducer: &Reducer<Product, Option<Product>>,
    ) -> QueryResult<Option<Product>> {
        let wanted = in_category(category)?;
        let products = self.source.find_all_products()?;
        Ok(reduce_with(filter(products.iter(), &wanted), reducer))
    }

    fn pick_per_category(
        &self,
        reducer: &Reducer<Product, Option<Product>>,
    ) -> QueryResult<HashMap<Category, Option<Product>>> {
        let products = self.source.find_all_products()?;
        Ok(group_by_reduce(
            products.iter(),
            |p: &Product| p.category().clone(),
            reducer,
        ))
    }

    fn top_k_in_category(&self, category: &str, k: i64, direction: Direction) -> QueryResult<Vec<Product>> {
        let wanted = in_category(category)?;
        let products = self.source.find_all_products()?;
        let ranked = top_k(filter(products.iter(), &wanted), |p| p.price(), k, direction);
        Ok(ranked.into_iter().cloned().collect())
    }

    fn distinct_products_of(&self, orders_wanted: &Predicate<Order>) -> QueryResult<Vec<Product>> {
        let orders = self.source.find_all_orders()?;
        let products = flat_map_join(filter(orders.iter(), orders_wanted), |o| o.products().iter());
        Ok(distinct(products).cloned().collect())
    }

    fn spend(&self, orders_wanted: &Predicate<Order>) -> QueryResult<SummaryStatistics> {
        let orders = self.source.find_all_orders()?;
        let products = flat_map_join(filter(orders.iter(), orders_wanted), |o| o.products().iter());
        Ok(summary_statistics(products, Product::price))
    }

    fn observe<R: ReportOutput>(
        &self,
        report: &'static str,
        run: impl FnOnce() -> QueryResult<R>,
    ) -> QueryResult<R> {
        let Some(observer) = self.observer.as_ref() else {
            return run();
        };

        observer.on_event(&ExecutionEvent::ReportStarted { report });
        let started = Instant::now();
        let result = run();
        let elapsed = started.elapsed();
        match &result {
            Ok(out) => observer.on_event(&ExecutionEvent::ReportFinished {
                report,
                elapsed,
                rows: out.rows(),
            }),
            Err(e) => observer.on_event(&ExecutionEvent::ReportFailed {
                report,
                elapsed,
                error: e.to_string(),
            }),
        }
        result
    }
}

// Rejects blank names before building the case-insensitive match.
fn in_category(category: &str) -> QueryResult<Predicate<Product>> {
    Category::new(category)?;
    Ok(category_equals(category))
}

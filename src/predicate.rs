//! Composable boolean predicates over entities.
//!
//! A [`Predicate<T>`] is a pure, reusable, thread-safe `&T -> bool` function. Predicates combine
//! with [`Predicate::and`], [`Predicate::or`] and [`Predicate::not`]; `and`/`or` short-circuit,
//! so each operand runs at most once per entity.
//!
//! ```rust
//! use retail_query::predicate::{category_equals, price_above};
//! use retail_query::types::Product;
//!
//! let books_over_100 = category_equals("Books").and(price_above(100.0));
//! let p = Product::new(1, "Dune", "books", 150.0).unwrap();
//! assert!(books_over_100.test(&p));
//! assert!(!(!books_over_100).test(&p));
//! ```

use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::error::{QueryError, QueryResult};
use crate::types::{Customer, Order, Product};

/// Boolean-valued, side-effect-free function of one entity.
pub struct Predicate<T: ?Sized> {
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

impl<T: ?Sized + 'static> Predicate<T> {
    /// Wrap a plain function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self { test: Arc::new(f) }
    }

    /// A predicate that accepts everything.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Evaluate the predicate.
    pub fn test(&self, item: &T) -> bool {
        (self.test)(item)
    }

    /// Logical AND; `other` is not evaluated when `self` is false.
    pub fn and(self, other: Predicate<T>) -> Self {
        Self::new(move |item| self.test(item) && other.test(item))
    }

    /// Logical OR; `other` is not evaluated when `self` is true.
    pub fn or(self, other: Predicate<T>) -> Self {
        Self::new(move |item| self.test(item) || other.test(item))
    }

    /// Logical NOT.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(move |item| !self.test(item))
    }

    /// AND over any number of predicates; an empty list accepts everything.
    pub fn all(predicates: impl IntoIterator<Item = Predicate<T>>) -> Self {
        let predicates: Vec<_> = predicates.into_iter().collect();
        Self::new(move |item| predicates.iter().all(|p| p.test(item)))
    }

    /// OR over any number of predicates; an empty list rejects everything.
    pub fn any(predicates: impl IntoIterator<Item = Predicate<T>>) -> Self {
        let predicates: Vec<_> = predicates.into_iter().collect();
        Self::new(move |item| predicates.iter().any(|p| p.test(item)))
    }

    /// Lift this predicate to another entity type through a borrowing projection.
    pub fn map_input<U, F>(self, project: F) -> Predicate<U>
    where
        U: ?Sized + 'static,
        F: Fn(&U) -> &T + Send + Sync + 'static,
    {
        Predicate::new(move |item: &U| self.test(project(item)))
    }
}

impl<T: ?Sized + 'static> Not for Predicate<T> {
    type Output = Predicate<T>;

    fn not(self) -> Self::Output {
        Predicate::not(self)
    }
}

/// A calendar-date window with an explicit end-bound policy.
///
/// The two variants are deliberately separate: some queries include the end date, others stop
/// just before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// `start <= date <= end`.
    Inclusive { start: NaiveDate, end: NaiveDate },
    /// `start <= date < end`.
    HalfOpen { start: NaiveDate, end: NaiveDate },
}

impl DateRange {
    /// Both bounds included. Fails if `start > end`.
    pub fn inclusive(start: NaiveDate, end: NaiveDate) -> QueryResult<Self> {
        check_order(start, end)?;
        Ok(Self::Inclusive { start, end })
    }

    /// Start included, end excluded. Fails if `start > end`; `start == end` is an empty window.
    pub fn half_open(start: NaiveDate, end: NaiveDate) -> QueryResult<Self> {
        check_order(start, end)?;
        Ok(Self::HalfOpen { start, end })
    }

    /// The whole calendar month as a half-open range `[1st of month, 1st of next month)`.
    pub fn month(year: i32, month: u32) -> QueryResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| QueryError::invalid(format!("invalid month {year}-{month}")))?;
        let (next_year, next_month) = if start.month() == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(|| {
            QueryError::invalid(format!("month {year}-{month} has no successor"))
        })?;
        Self::half_open(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        match *self {
            Self::Inclusive { start, .. } | Self::HalfOpen { start, .. } => start,
        }
    }

    pub fn end(&self) -> NaiveDate {
        match *self {
            Self::Inclusive { end, .. } | Self::HalfOpen { end, .. } => end,
        }
    }

    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Self::Inclusive { start, end } => start <= date && date <= end,
            Self::HalfOpen { start, end } => start <= date && date < end,
        }
    }
}

fn check_order(start: NaiveDate, end: NaiveDate) -> QueryResult<()> {
    if start > end {
        return Err(QueryError::invalid(format!(
            "date range start {start} is after end {end}"
        )));
    }
    Ok(())
}

/// Case-insensitive exact match on [`Product::category`].
pub fn category_equals(category: impl Into<String>) -> Predicate<Product> {
    let category = category.into();
    Predicate::new(move |p: &Product| p.category().matches(&category))
}

/// `price > threshold`.
pub fn price_above(threshold: f64) -> Predicate<Product> {
    Predicate::new(move |p: &Product| p.price() > threshold)
}

/// `price < threshold`.
pub fn price_below(threshold: f64) -> Predicate<Product> {
    Predicate::new(move |p: &Product| p.price() < threshold)
}

/// Exact match on [`Customer::tier`].
pub fn tier_equals(tier: u8) -> Predicate<Customer> {
    Predicate::new(move |c: &Customer| c.tier() == tier)
}

/// Order date within `[start, end]`, both inclusive.
pub fn date_in_range(start: NaiveDate, end: NaiveDate) -> QueryResult<Predicate<Order>> {
    Ok(date_in(DateRange::inclusive(start, end)?))
}

/// Order date within `range`, using whichever bound policy the range carries.
pub fn date_in(range: DateRange) -> Predicate<Order> {
    Predicate::new(move |o: &Order| range.contains(o.order_date()))
}

/// Order placed exactly on `date`.
pub fn placed_on(date: NaiveDate) -> Predicate<Order> {
    Predicate::new(move |o: &Order| o.order_date() == date)
}

/// Order whose customer satisfies `customer`.
pub fn placed_by(customer: Predicate<Customer>) -> Predicate<Order> {
    customer.map_input(|o: &Order| o.customer())
}

/// Order containing at least one product that satisfies `product`.
///
/// An order without products never matches.
pub fn contains_product(product: Predicate<Product>) -> Predicate<Order> {
    Predicate::new(move |o: &Order| o.products().iter().any(|p| product.test(p)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn counting(result: bool, calls: Arc<AtomicUsize>) -> Predicate<i32> {
        Predicate::new(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    fn order_on(id: i64, d: NaiveDate, tier: u8, products: Vec<Product>) -> Order {
        Order::new(id, d, Customer::new(id, "c", tier), products)
    }

    #[test]
    fn category_match_ignores_case() {
        let p = Product::new(1, "Dune", "BOOKS", 10.0).unwrap();
        assert!(category_equals("books").test(&p));
        assert!(!category_equals("Book").test(&p));
    }

    #[test]
    fn price_thresholds_are_strict() {
        let p = Product::new(1, "Dune", "Books", 100.0).unwrap();
        assert!(!price_above(100.0).test(&p));
        assert!(!price_below(100.0).test(&p));
        assert!(price_above(99.99).test(&p));
        assert!(price_below(100.01).test(&p));
    }

    #[test]
    fn and_short_circuits_on_false() {
        let right = Arc::new(AtomicUsize::new(0));
        let p = counting(false, Arc::new(AtomicUsize::new(0))).and(counting(true, right.clone()));
        assert!(!p.test(&1));
        assert_eq!(right.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn or_short_circuits_on_true() {
        let right = Arc::new(AtomicUsize::new(0));
        let p = counting(true, Arc::new(AtomicUsize::new(0))).or(counting(false, right.clone()));
        assert!(p.test(&1));
        assert_eq!(right.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn shared_operand_is_evaluated_once_per_entity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shared = counting(true, calls.clone());
        let p = shared.clone().and(Predicate::always()).or(Predicate::new(|_| false));
        assert!(p.test(&7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Reusable: state does not carry over between invocations.
        assert!(p.test(&8));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn not_operator_negates() {
        let even = Predicate::new(|x: &i32| x % 2 == 0);
        assert!((!even.clone()).test(&3));
        assert!(!even.not().test(&4));
    }

    #[test]
    fn all_and_any_handle_empty_lists() {
        assert!(Predicate::<i32>::all(Vec::new()).test(&1));
        assert!(!Predicate::<i32>::any(Vec::new()).test(&1));
    }

    #[test]
    fn inclusive_and_half_open_ranges_differ_only_at_end() {
        let start = date(2021, 2, 1);
        let end = date(2021, 4, 1);
        let inclusive = DateRange::inclusive(start, end).unwrap();
        let half_open = DateRange::half_open(start, end).unwrap();

        assert!(inclusive.contains(start) && half_open.contains(start));
        assert!(inclusive.contains(end));
        assert!(!half_open.contains(end));
        assert!(!inclusive.contains(date(2021, 1, 31)));
    }

    #[test]
    fn reversed_range_is_invalid() {
        let err = DateRange::inclusive(date(2021, 3, 1), date(2021, 2, 1)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument { .. }));
        assert!(date_in_range(date(2021, 3, 1), date(2021, 2, 1)).is_err());
    }

    #[test]
    fn month_range_covers_the_calendar_month() {
        let feb = DateRange::month(2021, 2).unwrap();
        assert_eq!(feb.start(), date(2021, 2, 1));
        assert_eq!(feb.end(), date(2021, 3, 1));
        assert!(feb.contains(date(2021, 2, 28)));
        assert!(!feb.contains(date(2021, 3, 1)));

        let dec = DateRange::month(2021, 12).unwrap();
        assert_eq!(dec.end(), date(2022, 1, 1));

        assert!(DateRange::month(2021, 13).is_err());
    }

    #[test]
    fn order_predicates_reach_customer_and_products() {
        let baby = Product::new(1, "Rattle", "Baby", 5.0).unwrap();
        let with_baby = order_on(1, date(2021, 3, 15), 2, vec![baby]);
        let empty = order_on(2, date(2021, 3, 15), 1, Vec::new());

        let has_baby = contains_product(category_equals("baby"));
        assert!(has_baby.test(&with_baby));
        assert!(!has_baby.test(&empty));

        let tier_two = placed_by(tier_equals(2));
        assert!(tier_two.test(&with_baby));
        assert!(!tier_two.test(&empty));

        assert!(placed_on(date(2021, 3, 15)).test(&empty));
        assert!(!placed_on(date(2021, 3, 16)).test(&empty));
    }
}

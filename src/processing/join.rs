//! Cross-entity traversal and de-duplication.

use std::collections::HashSet;
use std::hash::Hash;

/// For each element obtain a sub-sequence and concatenate them all, in source order.
///
/// Used for order → product traversal:
///
/// ```rust
/// use retail_query::processing::{distinct, flat_map_join};
/// # use retail_query::types::{Customer, Order, Product};
/// # let p1 = Product::new(1, "a", "Books", 1.0).unwrap();
/// # let c = Customer::new(1, "Ada", 1);
/// # let d = chrono::NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
/// # let orders = vec![Order::new(1, d, c.clone(), vec![p1.clone()]), Order::new(2, d, c, vec![p1])];
/// let products: Vec<_> = distinct(flat_map_join(orders.iter(), |o| o.products())).collect();
/// assert_eq!(products.len(), 1);
/// ```
pub fn flat_map_join<I, J, F>(seq: I, expand: F) -> impl Iterator<Item = J::Item>
where
    I: IntoIterator,
    J: IntoIterator,
    F: FnMut(I::Item) -> J,
{
    seq.into_iter().flat_map(expand)
}

/// Lazily removes duplicates by identity-equality, keeping the first occurrence.
pub fn distinct<I>(seq: I) -> impl Iterator<Item = I::Item>
where
    I: IntoIterator,
    I::Item: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();
    seq.into_iter().filter(move |item| seen.insert(item.clone()))
}

//! Core entity model.
//!
//! Three immutable entity types ([`Customer`], [`Product`], [`Order`]) plus the [`Catalog`] that
//! bundles one [`Snapshot`] of each. Equality and hashing of every entity is by id alone, so two
//! values carrying the same id are the same entity for `distinct` and `group_by`.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Immutable, shareable point-in-time collection of entities.
pub type Snapshot<T> = Arc<[T]>;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Type-safe identifier for customers.
    CustomerId,
    "customer"
);
entity_id!(
    /// Type-safe identifier for products.
    ProductId,
    "product"
);
entity_id!(
    /// Type-safe identifier for orders.
    OrderId,
    "order"
);

/// Product category.
///
/// Keeps the spelling it was created with, but compares and hashes case-insensitively:
/// `"Books"`, `"books"` and `"BOOKS"` are the same category.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Create a category. Blank names are rejected.
    pub fn new(name: impl Into<String>) -> QueryResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(QueryError::invalid("category must not be blank"));
        }
        Ok(Self(name))
    }

    /// The category name as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw name.
    pub fn matches(&self, name: &str) -> bool {
        folded(&self.0).eq(folded(name))
    }
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in folded(&self.0) {
            c.hash(state);
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A customer. Identity is [`CustomerId`].
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    tier: u8,
}

impl Customer {
    /// Create a new customer.
    pub fn new(id: i64, name: impl Into<String>, tier: u8) -> Self {
        Self {
            id: CustomerId(id),
            name: name.into(),
            tier,
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classification rank used by tier queries.
    pub fn tier(&self) -> u8 {
        self.tier
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Customer {}

impl Hash for Customer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A product. Identity is [`ProductId`].
///
/// The price is always finite and non-negative. Use [`Product::with_price`] to derive a re-priced
/// copy; a product value is never changed in place.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    id: ProductId,
    name: String,
    category: Category,
    price: f64,
}

impl Product {
    /// Create a new product.
    ///
    /// Returns [`QueryError::InvalidArgument`] for a blank category or a negative / non-finite
    /// price.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
    ) -> QueryResult<Self> {
        Ok(Self {
            id: ProductId(id),
            name: name.into(),
            category: Category::new(category)?,
            price: checked_price(price)?,
        })
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Returns a new product with `price` and every other field unchanged.
    pub fn with_price(&self, price: f64) -> QueryResult<Self> {
        Ok(Self {
            price: checked_price(price)?,
            ..self.clone()
        })
    }
}

fn checked_price(price: f64) -> QueryResult<f64> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(QueryError::invalid(format!(
            "price must be a finite non-negative number, got {price}"
        )))
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Product {}

impl Hash for Product {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// An order placed by one customer for a set of products. Identity is [`OrderId`].
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    id: OrderId,
    order_date: NaiveDate,
    customer: Customer,
    products: Vec<Product>,
}

impl Order {
    /// Create a new order.
    ///
    /// Products form a set: a product whose id was already seen is dropped, keeping the
    /// first-seen order.
    pub fn new(
        id: i64,
        order_date: NaiveDate,
        customer: Customer,
        products: impl IntoIterator<Item = Product>,
    ) -> Self {
        let mut seen = HashSet::new();
        let products = products
            .into_iter()
            .filter(|p| seen.insert(p.id))
            .collect();
        Self {
            id: OrderId(id),
            order_date,
            customer,
            products,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Order {}

impl Hash for Order {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One snapshot of each entity collection.
///
/// Construction checks that ids are unique per collection and that every order refers to a
/// customer and products present in the catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    customers: Snapshot<Customer>,
    products: Snapshot<Product>,
    orders: Snapshot<Order>,
}

impl Catalog {
    /// Create a catalog from the three collections.
    pub fn new(
        customers: impl Into<Snapshot<Customer>>,
        products: impl Into<Snapshot<Product>>,
        orders: impl Into<Snapshot<Order>>,
    ) -> QueryResult<Self> {
        let customers = customers.into();
        let products = products.into();
        let orders = orders.into();

        let customer_ids = unique_ids("customer", customers.iter().map(|c| c.id().0))?;
        let product_ids = unique_ids("product", products.iter().map(|p| p.id().0))?;
        unique_ids("order", orders.iter().map(|o| o.id().0))?;

        for order in orders.iter() {
            if !customer_ids.contains(&order.customer().id().0) {
                return Err(QueryError::invalid(format!(
                    "{} refers to unknown {}",
                    order.id(),
                    order.customer().id()
                )));
            }
            if let Some(p) = order
                .products()
                .iter()
                .find(|p| !product_ids.contains(&p.id().0))
            {
                return Err(QueryError::invalid(format!(
                    "{} refers to unknown {}",
                    order.id(),
                    p.id()
                )));
            }
        }

        Ok(Self {
            customers,
            products,
            orders,
        })
    }

    pub fn customers(&self) -> &Snapshot<Customer> {
        &self.customers
    }

    pub fn products(&self) -> &Snapshot<Product> {
        &self.products
    }

    pub fn orders(&self) -> &Snapshot<Order> {
        &self.orders
    }
}

fn unique_ids(entity: &str, ids: impl Iterator<Item = i64>) -> QueryResult<HashSet<i64>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(QueryError::invalid(format!("duplicate {entity} id {id}")));
        }
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::NaiveDate;

    use super::{Catalog, Category, Customer, Order, Product};
    use crate::error::QueryError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn category_compares_and_hashes_case_insensitively() {
        let a = Category::new("Books").unwrap();
        let b = Category::new("bOOKS").unwrap();
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(Category::new("Toys").unwrap().matches("TOYS"));
    }

    #[test]
    fn blank_category_is_rejected() {
        let err = Category::new("  ").unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument { .. }));
    }

    #[test]
    fn product_rejects_negative_and_nan_prices() {
        assert!(Product::new(1, "a", "Books", -1.0).is_err());
        assert!(Product::new(1, "a", "Books", f64::NAN).is_err());
        assert!(Product::new(1, "a", "Books", 0.0).is_ok());
    }

    #[test]
    fn with_price_returns_new_value_and_leaves_original_untouched() {
        let original = Product::new(3, "Kite", "Toys", 20.0).unwrap();
        let discounted = original.with_price(18.0).unwrap();

        assert_eq!(discounted.price(), 18.0);
        assert_eq!(discounted.name(), "Kite");
        assert_eq!(discounted.category().as_str(), "Toys");
        assert_eq!(original.price(), 20.0);
        // Same identity.
        assert_eq!(original, discounted);
    }

    #[test]
    fn entities_are_equal_by_id_only() {
        assert_eq!(Customer::new(1, "Ada", 1), Customer::new(1, "Grace", 3));
        assert_ne!(Customer::new(1, "Ada", 1), Customer::new(2, "Ada", 1));
    }

    #[test]
    fn order_drops_duplicate_products_keeping_first_seen_order() {
        let p1 = Product::new(1, "a", "Books", 1.0).unwrap();
        let p2 = Product::new(2, "b", "Books", 2.0).unwrap();
        let order = Order::new(
            10,
            date(2021, 3, 15),
            Customer::new(1, "Ada", 1),
            vec![p2.clone(), p1.clone(), p2.clone()],
        );
        assert_eq!(order.products(), &[p2, p1]);
    }

    #[test]
    fn catalog_rejects_unknown_references_and_duplicate_ids() {
        let ada = Customer::new(1, "Ada", 1);
        let p1 = Product::new(1, "a", "Books", 1.0).unwrap();
        let ghost = Product::new(99, "ghost", "Books", 1.0).unwrap();

        let order = Order::new(10, date(2021, 1, 1), ada.clone(), vec![ghost]);
        let err = Catalog::new(vec![ada.clone()], vec![p1.clone()], vec![order]).unwrap_err();
        assert!(err.to_string().contains("product_99"));

        let err = Catalog::new(vec![ada.clone(), ada.clone()], vec![p1], Vec::new()).unwrap_err();
        assert!(err.to_string().contains("duplicate customer id 1"));
    }
}

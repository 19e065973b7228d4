//! On-disk record shapes and their conversion into entities.
//!
//! Records are the flat, serde-friendly form of each entity: orders refer to their customer and
//! products by id. [`References`] resolves those ids against already-loaded customers and
//! products.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Customer, Order, Product};

/// Date layout used by order files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Separator between ids in the CSV `product_ids` column.
pub const ID_LIST_SEPARATOR: char = ';';

/// A deserializable record of one entity collection.
pub trait Record: DeserializeOwned {
    /// Entity name used in error messages.
    const ENTITY: &'static str;
    /// Columns a CSV header must contain (order may differ).
    const COLUMNS: &'static [&'static str];
}

/// A record paired with its 1-based source row (CSV rows count the header).
pub type Located<R> = (usize, R);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub name: String,
    pub tier: u8,
}

impl Record for CustomerRecord {
    const ENTITY: &'static str = "customer";
    const COLUMNS: &'static [&'static str] = &["id", "name", "tier"];
}

impl CustomerRecord {
    pub fn into_customer(self) -> Customer {
        Customer::new(self.id, self.name, self.tier)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
}

impl Record for ProductRecord {
    const ENTITY: &'static str = "product";
    const COLUMNS: &'static [&'static str] = &["id", "name", "category", "price"];
}

impl ProductRecord {
    /// Validates category and price.
    pub fn into_product(self, row: usize) -> IngestionResult<Product> {
        let raw = format!("category={:?} price={}", self.category, self.price);
        Product::new(self.id, self.name, self.category, self.price).map_err(|e| {
            IngestionError::ParseError {
                row,
                column: "category/price".to_string(),
                raw,
                message: e.to_string(),
            }
        })
    }
}

/// Order record as found in JSON inputs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub customer_id: i64,
    pub order_date: String,
    #[serde(default)]
    pub product_ids: Vec<i64>,
}

impl Record for OrderRecord {
    const ENTITY: &'static str = "order";
    const COLUMNS: &'static [&'static str] = &["id", "customer_id", "order_date", "product_ids"];
}

/// Order record as found in CSV inputs: `product_ids` is a `;`-separated list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CsvOrderRecord {
    pub id: i64,
    pub customer_id: i64,
    pub order_date: String,
    pub product_ids: String,
}

impl Record for CsvOrderRecord {
    const ENTITY: &'static str = "order";
    const COLUMNS: &'static [&'static str] = OrderRecord::COLUMNS;
}

impl CsvOrderRecord {
    /// Split the id list; blank input means an order without products.
    pub fn into_order_record(self, row: usize) -> IngestionResult<OrderRecord> {
        let product_ids = self
            .product_ids
            .split(ID_LIST_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>().map_err(|e| IngestionError::ParseError {
                    row,
                    column: "product_ids".to_string(),
                    raw: self.product_ids.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<IngestionResult<Vec<_>>>()?;

        Ok(OrderRecord {
            id: self.id,
            customer_id: self.customer_id,
            order_date: self.order_date,
            product_ids,
        })
    }
}

/// Id lookups used to resolve order references.
#[derive(Debug, Default)]
pub struct References {
    customers: HashMap<i64, Customer>,
    products: HashMap<i64, Product>,
}

impl References {
    /// Index customers and products by id. Duplicate ids are rejected.
    pub fn new(customers: &[Customer], products: &[Product]) -> IngestionResult<Self> {
        Ok(Self {
            customers: index("customer", customers, |c| c.id().0)?,
            products: index("product", products, |p| p.id().0)?,
        })
    }

    /// Build an [`Order`] from its record.
    pub fn resolve(&self, row: usize, record: OrderRecord) -> IngestionResult<Order> {
        let order_date = NaiveDate::parse_from_str(record.order_date.trim(), DATE_FORMAT)
            .map_err(|e| IngestionError::ParseError {
                row,
                column: "order_date".to_string(),
                raw: record.order_date.clone(),
                message: e.to_string(),
            })?;

        let customer = self
            .customers
            .get(&record.customer_id)
            .cloned()
            .ok_or_else(|| IngestionError::UnresolvedReference {
                entity: "order",
                id: record.id,
                message: format!("unknown customer id {}", record.customer_id),
            })?;

        let products = record
            .product_ids
            .iter()
            .map(|id| {
                self.products
                    .get(id)
                    .cloned()
                    .ok_or_else(|| IngestionError::UnresolvedReference {
                        entity: "order",
                        id: record.id,
                        message: format!("unknown product id {id}"),
                    })
            })
            .collect::<IngestionResult<Vec<_>>>()?;

        Ok(Order::new(record.id, order_date, customer, products))
    }
}

fn index<T: Clone>(
    entity: &'static str,
    items: &[T],
    id: impl Fn(&T) -> i64,
) -> IngestionResult<HashMap<i64, T>> {
    let mut out = HashMap::with_capacity(items.len());
    for item in items {
        if out.insert(id(item), item.clone()).is_some() {
            return Err(IngestionError::DuplicateId {
                entity,
                id: id(item),
            });
        }
    }
    Ok(out)
}

/// Reject records sharing an id within one collection.
pub fn ensure_unique_ids<R>(
    entity: &'static str,
    rows: &[Located<R>],
    id: impl Fn(&R) -> i64,
) -> IngestionResult<()> {
    let mut seen = HashSet::with_capacity(rows.len());
    for (_, record) in rows {
        if !seen.insert(id(record)) {
            return Err(IngestionError::DuplicateId {
                entity,
                id: id(record),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CsvOrderRecord, OrderRecord, ProductRecord, References};
    use crate::error::IngestionError;
    use crate::types::{Customer, Product};

    fn refs() -> References {
        References::new(
            &[Customer::new(1, "Ada", 2)],
            &[
                Product::new(1, "Dune", "Books", 10.0).unwrap(),
                Product::new(2, "Kite", "Toys", 20.0).unwrap(),
            ],
        )
        .unwrap()
    }

    fn record(customer_id: i64, date: &str, product_ids: Vec<i64>) -> OrderRecord {
        OrderRecord {
            id: 10,
            customer_id,
            order_date: date.to_string(),
            product_ids,
        }
    }

    #[test]
    fn resolves_customer_and_products() {
        let order = refs().resolve(1, record(1, "2021-03-15", vec![2, 1])).unwrap();
        assert_eq!(order.customer().name(), "Ada");
        let ids: Vec<i64> = order.products().iter().map(|p| p.id().0).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn unknown_references_are_reported() {
        let err = refs().resolve(1, record(9, "2021-03-15", vec![])).unwrap_err();
        assert!(err.to_string().contains("unknown customer id 9"));

        let err = refs().resolve(1, record(1, "2021-03-15", vec![1, 7])).unwrap_err();
        assert!(matches!(err, IngestionError::UnresolvedReference { id: 10, .. }));
        assert!(err.to_string().contains("unknown product id 7"));
    }

    #[test]
    fn bad_date_is_a_parse_error() {
        let err = refs().resolve(4, record(1, "15/03/2021", vec![])).unwrap_err();
        match err {
            IngestionError::ParseError { row, column, .. } => {
                assert_eq!(row, 4);
                assert_eq!(column, "order_date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn csv_id_list_is_split_and_trimmed() {
        let rec = CsvOrderRecord {
            id: 1,
            customer_id: 1,
            order_date: "2021-01-01".to_string(),
            product_ids: " 3; 1 ;2".to_string(),
        };
        assert_eq!(rec.into_order_record(2).unwrap().product_ids, vec![3, 1, 2]);

        let empty = CsvOrderRecord {
            id: 1,
            customer_id: 1,
            order_date: "2021-01-01".to_string(),
            product_ids: String::new(),
        };
        assert!(empty.into_order_record(2).unwrap().product_ids.is_empty());
    }

    #[test]
    fn negative_price_is_rejected_on_conversion() {
        let rec = ProductRecord {
            id: 1,
            name: "x".to_string(),
            category: "Books".to_string(),
            price: -3.0,
        };
        assert!(matches!(
            rec.into_product(5).unwrap_err(),
            IngestionError::ParseError { row: 5, .. }
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let c = Customer::new(1, "Ada", 1);
        let err = References::new(&[c.clone(), c], &[]).unwrap_err();
        assert!(matches!(err, IngestionError::DuplicateId { entity: "customer", id: 1 }));
    }
}

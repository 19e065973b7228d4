use chrono::{Days, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use retail_query::predicate::DateRange;
use retail_query::reports::Reports;
use retail_query::types::{Catalog, Customer, Order, Product};

fn catalog(customers: usize, products: usize, orders: usize) -> Catalog {
    let categories = ["Books", "Toys", "Baby"];
    let customers: Vec<Customer> = (0..customers)
        .map(|i| Customer::new(i as i64, format!("c{i}"), (i % 3 + 1) as u8))
        .collect();
    let products: Vec<Product> = (0..products)
        .map(|i| {
            Product::new(i as i64, format!("p{i}"), categories[i % 3], (i % 97) as f64 + 0.5)
                .expect("valid product")
        })
        .collect();
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date");
    let orders: Vec<Order> = (0..orders)
        .map(|i| {
            let date = start + Days::new((i % 365) as u64);
            let items = (0..4).map(|k| products[(i * 7 + k * 13) % products.len()].clone());
            Order::new(i as i64, date, customers[i % customers.len()].clone(), items)
        })
        .collect();
    Catalog::new(customers, products, orders).expect("consistent catalog")
}

fn bench_reports(c: &mut Criterion) {
    let reports = Reports::new(catalog(500, 2_000, 20_000));
    let q1 = DateRange::inclusive(
        NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2021, 3, 31).expect("valid date"),
    )
    .expect("ordered range");

    c.bench_function("cheapest_per_category", |b| {
        b.iter(|| reports.cheapest_per_category().expect("report"))
    });
    c.bench_function("products_by_tier_between", |b| {
        b.iter(|| reports.products_by_tier_between(2, q1).expect("report"))
    });
    c.bench_function("total_spend_in_month", |b| {
        b.iter(|| reports.total_spend_in_month(2021, 2).expect("report"))
    });
    c.bench_function("orders_by_customer", |b| {
        b.iter(|| reports.orders_by_customer().expect("report"))
    });
    c.bench_function("most_recent_orders", |b| {
        b.iter(|| reports.most_recent_orders(50).expect("report"))
    });
}

criterion_group!(benches, bench_reports);
criterion_main!(benches);

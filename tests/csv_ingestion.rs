use retail_query::IngestionError;
use retail_query::ingestion::{CatalogPaths, IngestionFormat, IngestionOptions, load_catalog, load_products};

#[test]
fn csv_catalog_matches_json_catalog() {
    let opts = IngestionOptions::default();
    let csv = load_catalog(&CatalogPaths::in_dir("tests/fixtures", "csv"), &opts).unwrap();
    let json = load_catalog(&CatalogPaths::in_dir("tests/fixtures", "json"), &opts).unwrap();

    assert_eq!(csv.customers().len(), json.customers().len());
    for (a, b) in csv.products().iter().zip(json.products().iter()) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.name(), b.name());
        assert_eq!(a.category(), b.category());
        assert_eq!(a.price(), b.price());
    }
    for (a, b) in csv.orders().iter().zip(json.orders().iter()) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.customer(), b.customer());
        assert_eq!(a.order_date(), b.order_date());
        assert_eq!(a.products(), b.products());
    }
}

#[test]
fn csv_bad_value_reports_row_and_column() {
    let err = load_products("tests/fixtures/products_bad_price.csv", &IngestionOptions::default()).unwrap_err();
    match err {
        IngestionError::ParseError { row, column, raw, .. } => {
            assert_eq!(row, 3);
            assert_eq!(column, "price");
            assert_eq!(raw, "cheap");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn csv_duplicate_order_ids_are_rejected() {
    let paths = CatalogPaths {
        orders: "tests/fixtures/orders_duplicate_id.csv".into(),
        ..CatalogPaths::in_dir("tests/fixtures", "csv")
    };
    let err = load_catalog(&paths, &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, IngestionError::DuplicateId { entity: "order", id: 10 }));
}

#[test]
fn forced_format_overrides_extension() {
    let opts = IngestionOptions {
        format: Some(IngestionFormat::Csv),
        ..Default::default()
    };
    // JSON content read as CSV has none of the required headers.
    let err = load_products("tests/fixtures/products.json", &opts).unwrap_err();
    assert!(err.to_string().contains("missing required product column"));
}

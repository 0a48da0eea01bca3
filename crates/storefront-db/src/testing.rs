//! Shared fixtures for the unit tests in this crate.

use sqlx::SqliteConnection;
use std::path::PathBuf;

use crate::pool::{Database, DbConfig};
use crate::repository::catalog::CatalogRepository;
use crate::repository::pricing::PricingResolver;
use crate::repository::stock::StockLedger;
use storefront_core::{Money, NewProduct, UnitOfMeasure, DEFAULT_LOCATION_ID};

pub async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// File-backed database with several pooled connections, for tests that
/// need real concurrent writers. Returns the path so the test can clean up.
pub async fn file_db(max_connections: u32) -> (Database, PathBuf) {
    file_db_with(|config| config.max_connections(max_connections)).await
}

/// Like [`file_db`], with the pool settings adjusted by `configure`.
pub async fn file_db_with(configure: impl FnOnce(DbConfig) -> DbConfig) -> (Database, PathBuf) {
    let path = std::env::temp_dir().join(format!("storefront-test-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(configure(DbConfig::new(&path))).await.unwrap();
    (db, path)
}

pub fn remove_db_files(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

/// Inserts an unpriced product with no stock.
pub async fn product(conn: &mut SqliteConnection, sku: &str) -> i64 {
    CatalogRepository::create_product(
        conn,
        &NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category_id: None,
            brand_id: None,
            unit: UnitOfMeasure::Each,
        },
    )
    .await
    .unwrap()
    .id
}

/// Inserts a product with a current price and opening stock at the default
/// location.
pub async fn stocked_product(conn: &mut SqliteConnection, sku: &str, price_cents: i64, stock: i64) -> i64 {
    let id = product(conn, sku).await;
    PricingResolver::record_price(conn, id, Money::from_cents(price_cents))
        .await
        .unwrap();
    if stock > 0 {
        StockLedger::increment(conn, id, DEFAULT_LOCATION_ID, stock)
            .await
            .unwrap();
    }
    id
}

pub async fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&mut *conn)
        .await
        .unwrap()
}

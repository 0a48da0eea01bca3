//! # Catalog Repository
//!
//! Products and their classification (category, brand), plus stock
//! locations. Read-mostly: the engine only looks products up.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbResult, EngineResult};
use storefront_core::validation::{validate_name, validate_sku};
use storefront_core::{Brand, Category, Location, NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, sku, name, category_id, brand_id, unit, created_at, updated_at";

/// Stateless access to the catalog tables.
pub struct CatalogRepository;

impl CatalogRepository {
    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Inserts a product after validating SKU and name.
    ///
    /// A duplicate SKU surfaces as `DbError::UniqueViolation`.
    pub async fn create_product(
        conn: &mut SqliteConnection,
        product: &NewProduct,
    ) -> EngineResult<Product> {
        validate_sku(&product.sku)?;
        validate_name("name", &product.name)?;

        let now = Utc::now();
        debug!(sku = %product.sku, "Inserting product");

        let created = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (sku, name, category_id, brand_id, unit, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.sku.trim())
        .bind(product.name.trim())
        .bind(product.category_id)
        .bind(product.brand_id)
        .bind(product.unit)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }

    pub async fn get_product(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    pub async fn get_product_by_sku(
        conn: &mut SqliteConnection,
        sku: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku.trim())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    pub async fn product_exists(conn: &mut SqliteConnection, id: i64) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn count_products(conn: &mut SqliteConnection) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    pub async fn list_products(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id"
        ))
        .fetch_all(&mut *conn)
        .await?;
        Ok(products)
    }

    // -------------------------------------------------------------------------
    // Classification
    // -------------------------------------------------------------------------

    pub async fn create_category(conn: &mut SqliteConnection, name: &str) -> EngineResult<Category> {
        validate_name("category name", name)?;
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES (?1) RETURNING id, name",
        )
        .bind(name.trim())
        .fetch_one(&mut *conn)
        .await?;
        Ok(category)
    }

    pub async fn list_categories(conn: &mut SqliteConnection) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    pub async fn create_brand(conn: &mut SqliteConnection, name: &str) -> EngineResult<Brand> {
        validate_name("brand name", name)?;
        let brand = sqlx::query_as::<_, Brand>(
            "INSERT INTO brands (name) VALUES (?1) RETURNING id, name",
        )
        .bind(name.trim())
        .fetch_one(&mut *conn)
        .await?;
        Ok(brand)
    }

    pub async fn list_brands(conn: &mut SqliteConnection) -> DbResult<Vec<Brand>> {
        let rows = sqlx::query_as::<_, Brand>("SELECT id, name FROM brands ORDER BY name")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    // -------------------------------------------------------------------------
    // Locations
    // -------------------------------------------------------------------------

    pub async fn create_location(conn: &mut SqliteConnection, name: &str) -> EngineResult<Location> {
        validate_name("location name", name)?;
        let location = sqlx::query_as::<_, Location>(
            "INSERT INTO locations (name) VALUES (?1) RETURNING id, name",
        )
        .bind(name.trim())
        .fetch_one(&mut *conn)
        .await?;
        Ok(location)
    }

    pub async fn location_exists(conn: &mut SqliteConnection, id: i64) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn list_locations(conn: &mut SqliteConnection) -> DbResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, Location>("SELECT id, name FROM locations ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }
}

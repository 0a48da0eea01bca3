//! # Party Repository
//!
//! Customers (who buy, classified by tier) and suppliers (who deliver).

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbResult, EngineResult};
use storefront_core::validation::validate_name;
use storefront_core::{Customer, CustomerTier, Supplier};

pub struct PartyRepository;

impl PartyRepository {
    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    pub async fn create_customer(
        conn: &mut SqliteConnection,
        name: &str,
        tier: CustomerTier,
    ) -> EngineResult<Customer> {
        validate_name("customer name", name)?;
        debug!(name = %name, tier = ?tier, "Creating customer");

        let customer = sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (name, tier, created_at) VALUES (?1, ?2, ?3)
             RETURNING id, name, tier, created_at",
        )
        .bind(name.trim())
        .bind(tier)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(customer)
    }

    pub async fn get_customer(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, tier, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(customer)
    }

    pub async fn list_customers(conn: &mut SqliteConnection) -> DbResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, Customer>(
            "SELECT id, name, tier, created_at FROM customers ORDER BY name, id",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    // -------------------------------------------------------------------------
    // Suppliers
    // -------------------------------------------------------------------------

    pub async fn create_supplier(
        conn: &mut SqliteConnection,
        name: &str,
        contact: Option<&str>,
    ) -> EngineResult<Supplier> {
        validate_name("supplier name", name)?;
        debug!(name = %name, "Creating supplier");

        let supplier = sqlx::query_as::<_, Supplier>(
            "INSERT INTO suppliers (name, contact, created_at) VALUES (?1, ?2, ?3)
             RETURNING id, name, contact, created_at",
        )
        .bind(name.trim())
        .bind(contact.map(str::trim).filter(|c| !c.is_empty()))
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(supplier)
    }

    pub async fn get_supplier(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, contact, created_at FROM suppliers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(supplier)
    }

    pub async fn list_suppliers(conn: &mut SqliteConnection) -> DbResult<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, contact, created_at FROM suppliers ORDER BY name, id",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_db;

    #[tokio::test]
    async fn test_customer_tier_round_trips() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let vip = PartyRepository::create_customer(&mut conn, "Ayesha", CustomerTier::Vip)
            .await
            .unwrap();
        PartyRepository::create_customer(&mut conn, "Bilal", CustomerTier::Standard)
            .await
            .unwrap();

        let fetched = PartyRepository::get_customer(&mut conn, vip.id).await.unwrap().unwrap();
        assert_eq!(fetched.tier, CustomerTier::Vip);
        assert_eq!(PartyRepository::list_customers(&mut conn).await.unwrap().len(), 2);
        assert!(PartyRepository::get_customer(&mut conn, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_supplier_blank_contact_stored_as_null() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let supplier = PartyRepository::create_supplier(&mut conn, "Metro Wholesale", Some("  "))
            .await
            .unwrap();
        assert_eq!(supplier.contact, None);

        let other = PartyRepository::create_supplier(&mut conn, "Fresh Farms", Some("042-111"))
            .await
            .unwrap();
        let fetched = PartyRepository::get_supplier(&mut conn, other.id).await.unwrap().unwrap();
        assert_eq!(fetched.contact.as_deref(), Some("042-111"));
        assert_eq!(PartyRepository::list_suppliers(&mut conn).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_customer_name_rejected() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        assert!(PartyRepository::create_customer(&mut conn, " ", CustomerTier::Standard)
            .await
            .is_err());
    }
}

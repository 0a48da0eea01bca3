//! # Demo Data Seeder
//!
//! Fills an empty database with a small demo store.
//!
//! ## Usage
//! ```bash
//! # Seed ./storefront_dev.db
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//! ```
//!
//! ## Seeded Data
//! - Categories and brands
//! - Products with a current selling price
//! - One standard and one VIP customer
//! - Two suppliers
//! - Opening stock, recorded as a received purchase per supplier so the
//!   ledger and the order history agree from the start

use std::env;
use storefront_core::{
    CustomerTier, Money, NewProduct, PurchaseLine, UnitOfMeasure,
};
use storefront_db::{
    CatalogRepository, Database, DbConfig, PartyRepository, PricingResolver,
    TransactionCoordinator,
};

/// (sku, name, category index, brand index, unit, price cents, cost cents, opening stock)
const PRODUCTS: &[(&str, &str, usize, usize, UnitOfMeasure, i64, i64, i64)] = &[
    ("BEV-COLA-330", "Cola Can 330ml", 0, 0, UnitOfMeasure::Each, 120, 80, 48),
    ("BEV-WATER-1L", "Mineral Water 1L", 0, 1, UnitOfMeasure::Each, 90, 45, 60),
    ("BEV-JUICE-1L", "Orange Juice 1L", 0, 1, UnitOfMeasure::Litre, 310, 210, 24),
    ("SNK-CHIPS-150", "Salted Chips 150g", 1, 2, UnitOfMeasure::Pack, 250, 160, 36),
    ("SNK-COOKIE-BOX", "Butter Cookies", 1, 2, UnitOfMeasure::Box, 575, 390, 12),
    ("DRY-MILK-1L", "Whole Milk 1L", 2, 3, UnitOfMeasure::Litre, 199, 140, 30),
    ("DRY-CHEESE-KG", "Cheddar Cheese", 2, 3, UnitOfMeasure::Kg, 1_450, 1_020, 8),
    ("GRO-RICE-5KG", "Basmati Rice 5kg", 3, 4, UnitOfMeasure::Pack, 1_899, 1_350, 15),
    ("GRO-PASTA-500", "Penne Pasta 500g", 3, 4, UnitOfMeasure::Pack, 169, 95, 40),
    ("GRO-SUGAR-1KG", "White Sugar 1kg", 3, 4, UnitOfMeasure::Kg, 145, 110, 0),
];

const CATEGORIES: &[&str] = &["Beverages", "Snacks", "Dairy", "Grocery"];
const BRANDS: &[&str] = &["Fizz Co", "Spring Valley", "Crunchy", "Meadow Farms", "Pantry Goods"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./storefront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Demo Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./storefront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Storefront Demo Seeder");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let mut conn = db.acquire().await?;

    let existing = CatalogRepository::count_products(&mut conn).await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        category_ids.push(CatalogRepository::create_category(&mut conn, name).await?.id);
    }
    let mut brand_ids = Vec::with_capacity(BRANDS.len());
    for name in BRANDS {
        brand_ids.push(CatalogRepository::create_brand(&mut conn, name).await?.id);
    }
    println!("✓ {} categories, {} brands", category_ids.len(), brand_ids.len());

    let mut deliveries: [Vec<PurchaseLine>; 2] = [Vec::new(), Vec::new()];
    for (idx, (sku, name, category, brand, unit, price, cost, stock)) in PRODUCTS.iter().enumerate() {
        let product = CatalogRepository::create_product(
            &mut conn,
            &NewProduct {
                sku: sku.to_string(),
                name: name.to_string(),
                category_id: Some(category_ids[*category]),
                brand_id: Some(brand_ids[*brand]),
                unit: *unit,
            },
        )
        .await?;
        PricingResolver::record_price(&mut conn, product.id, Money::from_cents(*price)).await?;

        if *stock > 0 {
            deliveries[idx % 2].push(PurchaseLine {
                product_id: product.id,
                quantity: *stock,
                unit_cost_cents: *cost,
            });
        }
    }
    println!("✓ {} products priced", PRODUCTS.len());

    PartyRepository::create_customer(&mut conn, "Walk-in Regular", CustomerTier::Standard).await?;
    PartyRepository::create_customer(&mut conn, "Gold Member", CustomerTier::Vip).await?;
    let suppliers = [
        PartyRepository::create_supplier(&mut conn, "Metro Wholesale", Some("orders@metro.example")).await?,
        PartyRepository::create_supplier(&mut conn, "Fresh Farms Ltd", None).await?,
    ];
    println!("✓ 2 customers, {} suppliers", suppliers.len());

    // The coordinator takes its own pooled connection.
    drop(conn);

    let coordinator = TransactionCoordinator::default();
    for (supplier, lines) in suppliers.iter().zip(deliveries.iter()) {
        if lines.is_empty() {
            continue;
        }
        let receipt = coordinator.create_purchase(&db, supplier.id, lines).await?;
        println!(
            "  Received {} lines from {} ({}, {})",
            lines.len(),
            supplier.name,
            receipt.reference,
            receipt.total()
        );
    }

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    db.close().await;
    Ok(())
}

//! # Repository Module
//!
//! SQL lives here and nowhere else.
//!
//! ## Connection Passing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every repository function takes `&mut SqliteConnection`:               │
//! │                                                                         │
//! │    let mut conn = db.acquire().await?;                                  │
//! │    PricingResolver::current_price(&mut conn, 7).await?;   // plain read │
//! │                                                                         │
//! │    let mut tx = conn.begin().await?;                                    │
//! │    OrderRepository::insert_header(&mut tx, &order).await?;             │
//! │    StockLedger::decrement(&mut tx, 7, 1, 2).await?;       // same tx    │
//! │    tx.commit().await?;                                                  │
//! │                                                                         │
//! │  The caller decides whether a call is part of a transaction. The       │
//! │  repositories never open their own.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - products, categories, brands, locations
//! - [`PartyRepository`](party::PartyRepository) - customers and suppliers
//! - [`PricingResolver`](pricing::PricingResolver) - append-only price log
//! - [`StockLedger`](stock::StockLedger) - quantity per (product, location)
//! - [`OrderRepository`](orders::OrderRepository) - order headers and lines

pub mod catalog;
pub mod orders;
pub mod party;
pub mod pricing;
pub mod stock;

//! # storefront-db: Database Layer and Transaction Engine
//!
//! SQLite storage for the catalog, parties, price log, stock ledger and
//! orders, plus the [`TransactionCoordinator`] that applies sales and
//! purchases atomically.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Data Flow                             │
//! │                                                                         │
//! │  CLI / POS UI / purchasing UI                                          │
//! │       │ create_sale, create_purchase          list_*, stock_snapshot    │
//! │       ▼                                                   ▲             │
//! │  ┌─────────────────────────────────────────────────────────┼───────┐   │
//! │  │                 storefront-db (THIS CRATE)              │       │   │
//! │  │                                                         │       │   │
//! │  │   TransactionCoordinator                      TransactionReader │   │
//! │  │        │  one transaction per order                     │       │   │
//! │  │        ▼                                                │       │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐  │       │   │
//! │  │   │ Catalog  │ │ Parties  │ │ Pricing  │ │  Stock   │──┘       │   │
//! │  │   │          │ │          │ │ Resolver │ │  Ledger  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │        │  &mut SqliteConnection (pool conn or transaction)      │   │
//! │  │        ▼                                                        │   │
//! │  │   Database (pool.rs) ── migrations (embedded)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on, busy timeout)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and the engine-level `EngineError`
//! - [`repository`] - Catalog, parties, pricing, stock ledger, orders
//! - [`coordinator`] - Sale and purchase units of work
//! - [`reader`] - Read-only views for reporting and UI collaborators
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_core::SaleLine;
//! use storefront_db::{Database, DbConfig, TransactionCoordinator};
//!
//! let db = Database::new(DbConfig::new("./storefront.db")).await?;
//! let coordinator = TransactionCoordinator::default();
//!
//! let receipt = coordinator
//!     .create_sale(&db, None, &[SaleLine { product_id: 7, quantity: 2 }])
//!     .await?;
//! println!("{} total {}", receipt.reference, receipt.total());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coordinator;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod reader;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use coordinator::{CoordinatorConfig, TransactionCoordinator};
pub use error::{DbError, DbResult, EngineError, EngineResult};
pub use pool::{Database, DbConfig};
pub use reader::TransactionReader;

pub use repository::catalog::CatalogRepository;
pub use repository::orders::OrderRepository;
pub use repository::party::PartyRepository;
pub use repository::pricing::PricingResolver;
pub use repository::stock::StockLedger;

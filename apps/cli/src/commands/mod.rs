//! # Commands
//!
//! ```text
//! commands/
//! ├── mod.rs       ◄─── subcommand tree, shared context, dispatch
//! ├── sale.rs      ◄─── storefront sale
//! ├── purchase.rs  ◄─── storefront purchase
//! └── report.rs    ◄─── stock, catalog, orders, order, prices
//! ```
//!
//! Every command returns a serializable value; `dispatch` turns it into
//! JSON and the caller decides where it goes.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::{ApiError, ErrorCode};
use storefront_db::{CatalogRepository, Database, TransactionCoordinator, TransactionReader};

pub mod purchase;
pub mod report;
pub mod sale;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sell products to a customer (or a walk-in)
    Sale(sale::SaleArgs),

    /// Receive a delivery from a supplier
    Purchase(purchase::PurchaseArgs),

    /// Units on hand for one product
    Stock(report::StockArgs),

    /// Every product with price and stock
    Catalog,

    /// Recent committed orders
    Orders(report::OrdersArgs),

    /// One committed order with its lines
    Order(report::OrderArgs),

    /// Price history of a product
    Prices(report::PricesArgs),
}

/// What every command may need, built once per invocation.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub db: Database,
    pub coordinator: TransactionCoordinator,
    pub reader: TransactionReader,
}

impl AppContext {
    /// Builds the coordinator from `config` and checks that the configured
    /// location exists.
    pub async fn new(db: Database, config: &AppConfig) -> Result<Self, ApiError> {
        let coordinator = TransactionCoordinator::new(config.coordinator_config())?;

        let location_id = config.store.default_location_id;
        let mut conn = db.acquire().await?;
        if !CatalogRepository::location_exists(&mut conn, location_id).await? {
            return Err(ApiError::new(
                ErrorCode::ConfigError,
                format!("Location {} does not exist", location_id),
            ));
        }
        drop(conn);

        Ok(AppContext {
            reader: TransactionReader::new(db.clone()),
            db,
            coordinator,
        })
    }
}

pub async fn dispatch(ctx: &AppContext, command: Command) -> Result<Value, ApiError> {
    match command {
        Command::Sale(args) => to_json(sale::run(ctx, &args).await?),
        Command::Purchase(args) => to_json(purchase::run(ctx, &args).await?),
        Command::Stock(args) => to_json(report::stock(ctx, &args).await?),
        Command::Catalog => to_json(report::catalog(ctx).await?),
        Command::Orders(args) => to_json(report::orders(ctx, &args).await?),
        Command::Order(args) => to_json(report::order(ctx, &args).await?),
        Command::Prices(args) => to_json(report::prices(ctx, &args).await?),
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

/// Splits `PRODUCT:QTY[:COST]` into its parts.
fn split_item(raw: &str, parts: usize, shape: &str) -> Result<Vec<String>, ApiError> {
    let fields: Vec<String> = raw.split(':').map(|s| s.trim().to_string()).collect();
    if fields.len() != parts || fields.iter().any(|f| f.is_empty()) {
        return Err(ApiError::validation(format!(
            "Invalid item '{}', expected {}",
            raw, shape
        )));
    }
    Ok(fields)
}

fn parse_id(raw: &str, field: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid {}: '{}'", field, raw)))
}

#[derive(Args, Debug)]
pub struct ItemArgs {
    /// PRODUCT:QTY (sale) or PRODUCT:QTY:COST (purchase), repeatable
    #[arg(long = "item", short = 'i', required = true)]
    pub items: Vec<String>,
}

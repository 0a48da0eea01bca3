//! Read-only commands backed by `TransactionReader`.

use clap::Args;
use serde::Serialize;
use std::str::FromStr;
use storefront_core::{CatalogEntry, OrderDetails, OrderKind, PriceSnapshot};

use super::AppContext;
use crate::error::ApiError;

#[derive(Args, Debug)]
pub struct StockArgs {
    pub product_id: i64,
}

#[derive(Args, Debug)]
pub struct OrdersArgs {
    /// sale | purchase
    #[arg(long)]
    pub kind: Option<String>,

    #[arg(long, default_value_t = 50)]
    pub limit: i64,
}

#[derive(Args, Debug)]
pub struct OrderArgs {
    pub order_id: i64,
}

#[derive(Args, Debug)]
pub struct PricesArgs {
    pub product_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StockLevel {
    pub product_id: i64,
    pub quantity_on_hand: i64,
}

pub async fn stock(ctx: &AppContext, args: &StockArgs) -> Result<StockLevel, ApiError> {
    let quantity_on_hand = ctx.reader.stock_snapshot(args.product_id).await?;
    Ok(StockLevel {
        product_id: args.product_id,
        quantity_on_hand,
    })
}

pub async fn catalog(ctx: &AppContext) -> Result<Vec<CatalogEntry>, ApiError> {
    Ok(ctx.reader.list_catalog().await?)
}

pub async fn orders(ctx: &AppContext, args: &OrdersArgs) -> Result<Vec<OrderDetails>, ApiError> {
    let kind = args.kind.as_deref().map(OrderKind::from_str).transpose()?;
    Ok(ctx.reader.list_transactions(kind, args.limit).await?)
}

pub async fn order(ctx: &AppContext, args: &OrderArgs) -> Result<OrderDetails, ApiError> {
    Ok(ctx.reader.get_transaction(args.order_id).await?)
}

pub async fn prices(ctx: &AppContext, args: &PricesArgs) -> Result<Vec<PriceSnapshot>, ApiError> {
    Ok(ctx.reader.price_history(args.product_id).await?)
}

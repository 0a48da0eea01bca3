//! `storefront purchase --supplier ID --item PRODUCT:QTY:COST ...`
//!
//! COST is a decimal amount such as `12.50`, parsed exactly to cents.

use clap::Args;
use std::str::FromStr;
use storefront_core::{CoreError, Money, OrderReceipt, PurchaseLine};

use super::{parse_id, split_item, AppContext, ItemArgs};
use crate::error::ApiError;

#[derive(Args, Debug)]
pub struct PurchaseArgs {
    #[arg(long)]
    pub supplier: i64,

    #[command(flatten)]
    pub items: ItemArgs,
}

pub fn parse_purchase_item(raw: &str) -> Result<PurchaseLine, ApiError> {
    let fields = split_item(raw, 3, "PRODUCT:QTY:COST")?;
    let product_id = parse_id(&fields[0], "product id")?;
    let quantity = parse_id(&fields[1], "quantity")?;

    let cost = Money::from_str(&fields[2]).map_err(|e| CoreError::InvalidCost {
        product_id,
        reason: e.to_string(),
    })?;
    if cost.is_negative() {
        return Err(CoreError::InvalidCost {
            product_id,
            reason: format!("cost {} is negative", cost),
        }
        .into());
    }

    Ok(PurchaseLine {
        product_id,
        quantity,
        unit_cost_cents: cost.cents(),
    })
}

pub async fn run(ctx: &AppContext, args: &PurchaseArgs) -> Result<OrderReceipt, ApiError> {
    let lines = args
        .items
        .items
        .iter()
        .map(|raw| parse_purchase_item(raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ctx
        .coordinator
        .create_purchase(&ctx.db, args.supplier, &lines)
        .await?)
}

//! `storefront sale [--customer ID] --item PRODUCT:QTY ...`

use clap::Args;
use storefront_core::{OrderReceipt, SaleLine};

use super::{parse_id, split_item, AppContext, ItemArgs};
use crate::error::ApiError;

#[derive(Args, Debug)]
pub struct SaleArgs {
    /// Customer id; omit for a walk-in sale
    #[arg(long)]
    pub customer: Option<i64>,

    #[command(flatten)]
    pub items: ItemArgs,
}

pub fn parse_sale_item(raw: &str) -> Result<SaleLine, ApiError> {
    let fields = split_item(raw, 2, "PRODUCT:QTY")?;
    Ok(SaleLine {
        product_id: parse_id(&fields[0], "product id")?,
        quantity: parse_id(&fields[1], "quantity")?,
    })
}

pub async fn run(ctx: &AppContext, args: &SaleArgs) -> Result<OrderReceipt, ApiError> {
    let lines = args
        .items
        .items
        .iter()
        .map(|raw| parse_sale_item(raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ctx
        .coordinator
        .create_sale(&ctx.db, args.customer, &lines)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use crate::error::ErrorCode;

    fn args(customer: Option<i64>, items: &[&str]) -> SaleArgs {
        SaleArgs {
            customer,
            items: ItemArgs {
                items: items.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    #[test]
    fn test_parse_sale_item() {
        assert_eq!(
            parse_sale_item("7:2").unwrap(),
            SaleLine {
                product_id: 7,
                quantity: 2
            }
        );
        assert!(parse_sale_item("seven:2").is_err());
        assert!(parse_sale_item("7:x").is_err());
    }

    #[tokio::test]
    async fn test_vip_sale() {
        let ctx = test_support::context().await;
        let product = test_support::stocked_product(&ctx, "A-1", 5_000, 10).await;
        let vip = test_support::vip_customer(&ctx).await;

        let receipt = run(&ctx, &args(Some(vip), &[&format!("{product}:2")]))
            .await
            .unwrap();
        assert_eq!(receipt.subtotal_cents, 10_000);
        assert_eq!(receipt.total_cents, 9_000);
    }

    #[tokio::test]
    async fn test_shortage_maps_to_code() {
        let ctx = test_support::context().await;
        let product = test_support::stocked_product(&ctx, "A-1", 100, 1).await;

        let err = run(&ctx, &args(None, &[&format!("{product}:3")]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
    }

    #[tokio::test]
    async fn test_zero_quantity_is_validation_error() {
        let ctx = test_support::context().await;
        let product = test_support::stocked_product(&ctx, "A-1", 100, 1).await;

        let err = run(&ctx, &args(None, &[&format!("{product}:0")]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}

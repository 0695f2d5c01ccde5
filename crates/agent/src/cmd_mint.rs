//! `mintsale mint`: one purchase batch through the controller.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, warn};

use mintsale_core::{
    MintOutcome, PurchaseController, Session, SystemClock, TimeSource, ZoneStateReconciler,
};

use crate::context::AppContext;

pub async fn run(ctx: &AppContext, quantity: u32, lucky: bool, address: Option<String>) -> Result<()> {
    let config = ctx.config.clone();
    let session = Session::new();
    let time: Arc<dyn TimeSource> = Arc::new(SystemClock);

    let reconciler = ZoneStateReconciler::new(
        session.clone(),
        config.zone_rules(),
        config.poll,
        config.mode,
        Arc::clone(&time),
    );
    let controller = PurchaseController::new(
        config.clone(),
        session.clone(),
        ctx.wallet(address),
        ctx.factory(),
        reconciler,
        time,
    );

    if lucky {
        // The draw is rolled locally; the sale process cannot tell a forced win apart.
        warn!(
            probability = config.purchase.lucky_draw_probability,
            "lucky draw is decided client-side"
        );
    }

    let address = controller.connect().await?;
    info!(address = %address, quantity, lucky, "minting");

    let outcome = controller.mint(quantity, lucky).await;
    let state = session.snapshot();
    match outcome {
        Ok(MintOutcome::Minted { quantity }) => {
            println!(
                "Minted {} NFT(s). Total minted: {}/{} ({:.1}%)",
                quantity,
                state.total_minted,
                config.total_supply,
                state.minted_percent(config.total_supply)
            );
            if let Some(price) = state.current_zone_info(&config.zone_rules()).and_then(|z| z.price) {
                println!("Paid: {} wAR", price.times(quantity));
            }
            Ok(())
        }
        Ok(MintOutcome::BetterLuckNextTime) => {
            println!("{}", state.notice.unwrap_or_default());
            Ok(())
        }
        Err(e) => bail!(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintsale_core::SaleConfig;

    #[tokio::test]
    async fn mock_mint_in_whitelist_zone_succeeds() {
        let ctx = AppContext::new(SaleConfig::default(), true);
        run(&ctx, 2, false, None).await.unwrap();
    }

    #[tokio::test]
    async fn quantity_above_zone_limit_fails() {
        let ctx = AppContext::new(SaleConfig::default(), true);
        let err = run(&ctx, 4, false, None).await.unwrap_err();
        assert!(err.to_string().contains("4"), "{err}");
    }
}

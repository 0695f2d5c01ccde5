//! `mintsale zone`: one fetch of the sale process, shown per zone.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use mintsale_core::session::minted_percent;
use mintsale_core::{decode_sale_info, ZoneInfo, ZoneRules, ZoneState};

use crate::context::AppContext;

#[derive(Debug, Serialize)]
pub struct ZoneReport {
    pub address: Option<String>,
    pub current_zone: u32,
    pub available: u64,
    pub total_minted: u64,
    pub total_supply: u64,
    pub minted_percent: f64,
    pub zones: Vec<ZoneInfo>,
}

impl ZoneReport {
    pub fn build(state: &ZoneState, address: Option<&str>, rules: &ZoneRules) -> Self {
        let count = state.info.master_whitelist.len().max(state.info.purchase_limits.len()) as u32;
        let total_minted = state.total_minted(rules.total_supply);
        Self {
            address: address.map(str::to_string),
            current_zone: state.current_zone(),
            available: state.available,
            total_minted,
            total_supply: rules.total_supply,
            minted_percent: minted_percent(total_minted, rules.total_supply),
            zones: (1..=count).map(|z| state.zone_info(z, address, rules)).collect(),
        }
    }

    pub fn to_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Zone {} | minted {}/{} ({:.1}%) | address {}\n",
            self.current_zone,
            self.total_minted,
            self.total_supply,
            self.minted_percent,
            self.address.as_deref().unwrap_or("-")
        ));
        output.push_str("┌──────┬──────────────┬──────────┬───────┬───────────┬─────────────┬──────────┐\n");
        output.push_str("│ Zone │ Price        │ Discount │ Limit │ Purchased │ Whitelisted │ Can buy  │\n");
        output.push_str("├──────┼──────────────┼──────────┼───────┼───────────┼─────────────┼──────────┤\n");
        for zone in &self.zones {
            let marker = if zone.zone == self.current_zone { "*" } else { " " };
            let price = zone.price.map(|p| format!("{} wAR", p)).unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "│ {}{:<3} │ {:<12} │ {:<8} │ {:>5} │ {:>9} │ {:<11} │ {:<8} │\n",
                marker,
                zone.zone,
                truncate_str(&price, 12),
                truncate_str(&zone.discount_label, 8),
                zone.limit,
                zone.purchased,
                yes_no(zone.is_whitelisted),
                yes_no(zone.can_purchase)
            ));
        }
        output.push_str("└──────┴──────────────┴──────────┴───────┴───────────┴─────────────┴──────────┘\n");
        output
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

pub async fn run(ctx: &AppContext, address: Option<String>, json: bool) -> Result<()> {
    let client = ctx.client().await?;
    let raw = client.get_info().await.context("info query failed")?;
    let info = decode_sale_info(&raw).context("unexpected info response")?;
    let available = client.query_nft_count().await.context("count query failed")?;

    let state = ZoneState { info, available, last_update: Utc::now() };
    let address = ctx.address(address);
    let report = ZoneReport::build(&state, address.as_deref(), &ctx.config.zone_rules());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_table());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintsale_core::{MockSaleClient, SaleClient, SaleConfig};

    async fn snapshot(zone: u32, available: u64) -> ZoneState {
        let client = MockSaleClient::simulated(zone, "alice", available);
        let info = decode_sale_info(&client.get_info().await.unwrap()).unwrap();
        ZoneState { info, available, last_update: Utc::now() }
    }

    #[tokio::test]
    async fn report_covers_every_zone() {
        let state = snapshot(1, 3000).await;
        let rules = SaleConfig::default().zone_rules();
        let report = ZoneReport::build(&state, Some("alice"), &rules);

        assert_eq!(report.zones.len(), 3);
        assert_eq!(report.total_minted, 333);
        assert!((report.minted_percent - 9.99).abs() < 0.01);
        assert!(report.zones[0].is_whitelisted);
        assert!(!report.zones[1].is_whitelisted);
        assert!(report.zones[2].is_whitelisted);

        let table = report.to_table();
        assert!(table.contains("minted 333/3333"));
        assert!(table.contains("0.5 wAR"));
    }

    #[tokio::test]
    async fn unknown_address_is_only_eligible_in_open_zone() {
        let state = snapshot(2, 3333).await;
        let rules = SaleConfig::default().zone_rules();
        let report = ZoneReport::build(&state, Some("bob"), &rules);

        assert_eq!(report.current_zone, 2);
        assert_eq!(report.total_minted, 0);
        let eligible: Vec<u32> = report.zones.iter().filter(|z| z.can_purchase).map(|z| z.zone).collect();
        assert_eq!(eligible, vec![3]);
    }

    #[test]
    fn truncates_long_labels() {
        assert_eq!(truncate_str("short", 8), "short");
        assert_eq!(truncate_str("a-very-long-label", 8), "a-very-…");
    }
}

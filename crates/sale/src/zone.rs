//! # Zone State
//!
//! The contract-driven variant of the sale. A [`ZoneState`] is the last
//! successfully decoded info response plus the instant it was applied.
//! Eligibility for a given zone and address is derived from it on demand
//! by [`ZoneState::zone_info`]; nothing derived is stored.
//!
//! Limits are enforced here only as a client-side gate. Whether the sale
//! process enforces the same limit is not assumed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::info::SaleInfo;
use crate::price::TokenAmount;

/// Rules that turn raw zone data into prices and eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRules {
    /// Zone open to every address.
    pub open_zone: u32,
    /// Decimal places of the payment token.
    pub token_decimals: u32,
    pub total_supply: u64,
}

/// Snapshot applied by the reconciler after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneState {
    pub info: SaleInfo,
    /// Remaining supply reported by the count query.
    pub available: u64,
    pub last_update: DateTime<Utc>,
}

/// Eligibility of one address in one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneInfo {
    pub zone: u32,
    /// `None` when the zone has no whitelist entry.
    pub price: Option<TokenAmount>,
    pub discount_label: String,
    pub limit: u32,
    pub purchased: u32,
    pub is_whitelisted: bool,
    pub can_purchase: bool,
}

impl ZoneInfo {
    /// Largest quantity the quantity control may reach for this address.
    #[must_use]
    pub fn max_mint(&self) -> u32 {
        if !self.can_purchase {
            return 0;
        }
        self.limit.saturating_sub(self.purchased)
    }
}

impl ZoneState {
    /// Minted so far, `|available - total_supply|`.
    #[must_use]
    pub fn total_minted(&self, total_supply: u64) -> u64 {
        self.available.abs_diff(total_supply)
    }

    /// Age of the snapshot at `now`; zero if `now` precedes the update.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.last_update).max(chrono::Duration::zero())
    }

    /// Whether the snapshot is older than `window`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, window: std::time::Duration) -> bool {
        match chrono::Duration::from_std(window) {
            Ok(window) => self.age(now) > window,
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn current_zone(&self) -> u32 {
        self.info.current_zone
    }

    /// Derives price and eligibility of `address` in `zone`.
    ///
    /// - price: the zone's whitelist amount at `rules.token_decimals`
    /// - whitelisted: `zone` is the open zone, or `address` is listed
    /// - can purchase: whitelisted and (no recorded purchase, or fewer than the limit)
    #[must_use]
    pub fn zone_info(&self, zone: u32, address: Option<&str>, rules: &ZoneRules) -> ZoneInfo {
        let index = zone.checked_sub(1).map(|i| i as usize);
        let entry = index.and_then(|i| self.info.master_whitelist.get(i));
        let limits = index.and_then(|i| self.info.purchase_limits.get(i));

        let price = entry.and_then(|e| TokenAmount::new(e.price_base_units, rules.token_decimals).ok());
        let limit = limits.map_or(0, |l| l.limit);
        let recorded = match (limits, address) {
            (Some(l), Some(addr)) => l.purchased_by_address.get(addr).copied(),
            _ => None,
        };

        let listed = match (entry, address) {
            (Some(e), Some(addr)) => e.contains(addr),
            _ => false,
        };
        let is_whitelisted = zone == rules.open_zone || listed;
        let can_purchase = is_whitelisted && recorded.map_or(true, |n| n < limit);

        ZoneInfo {
            zone,
            price,
            discount_label: entry.map(|e| e.discount_label.clone()).unwrap_or_default(),
            limit,
            purchased: recorded.unwrap_or(0),
            is_whitelisted,
            can_purchase,
        }
    }

    /// [`zone_info`](Self::zone_info) for the current zone.
    #[must_use]
    pub fn current_zone_info(&self, address: Option<&str>, rules: &ZoneRules) -> ZoneInfo {
        self.zone_info(self.current_zone(), address, rules)
    }
}

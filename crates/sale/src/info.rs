//! # Sale Info Decoding
//!
//! The sale process answers an info query with a loosely shaped JSON blob:
//!
//! ```text
//! {
//!   "Current_Zone":    2,
//!   "WhitelistZones":  [1, 2],
//!   "MasterWhitelist": [ ["500000000000", "50%", { "addr": true }], ... ],
//!   "PurchaseLimits":  [ [3, { "addr": 1 }], ... ]
//! }
//! ```
//!
//! [`decode_sale_info`] turns it into a typed [`SaleInfo`] or a
//! [`DecodeError`]. Nothing untyped crosses this boundary.
//!
//! ## Rules
//!
//! - Missing or `null` fields default: zone → 1, arrays → empty.
//! - A field that is present with the wrong type is an error.
//! - An empty JSON array where a map is expected is an empty map; the
//!   process runtime serialises empty tables as `[]`.
//! - Whitelist amounts must be unsigned integer strings.
//!
//! Index `i` of `MasterWhitelist` and `PurchaseLimits` describes zone `i + 1`.

use std::collections::{HashMap, HashSet};

use serde::de::{self, Deserializer};
use serde::Deserialize;
use thiserror::Error;

use crate::constants::DEFAULT_ZONE;

// ════════════════════════════════════════════════════════════════════════════════
// TYPED RESULT
// ════════════════════════════════════════════════════════════════════════════════

/// Whitelist configuration of one zone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WhitelistEntry {
    /// Unit price in payment-token base units.
    pub price_base_units: u128,
    pub discount_label: String,
    /// Addresses flagged `true` in the remote mapping.
    pub addresses: HashSet<String>,
}

impl WhitelistEntry {
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }
}

/// Purchase limit of one zone and what each address has bought in it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZoneEligibility {
    pub limit: u32,
    pub purchased_by_address: HashMap<String, u32>,
}

impl ZoneEligibility {
    #[must_use]
    pub fn purchased(&self, address: &str) -> u32 {
        self.purchased_by_address.get(address).copied().unwrap_or(0)
    }
}

/// Decoded info response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleInfo {
    pub current_zone: u32,
    pub whitelist_zones: Vec<u32>,
    pub master_whitelist: Vec<WhitelistEntry>,
    pub purchase_limits: Vec<ZoneEligibility>,
}

impl Default for SaleInfo {
    fn default() -> Self {
        Self {
            current_zone: DEFAULT_ZONE,
            whitelist_zones: Vec::new(),
            master_whitelist: Vec::new(),
            purchase_limits: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed sale info: {0}")]
    Malformed(String),

    #[error("zone index must be at least 1, got {0}")]
    InvalidZone(u32),

    #[error("whitelist amount for zone {zone} is not an unsigned integer: {amount:?}")]
    InvalidAmount { zone: usize, amount: String },
}

// ════════════════════════════════════════════════════════════════════════════════
// WIRE SHAPE
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct WireInfo {
    #[serde(rename = "Current_Zone", default)]
    current_zone: Option<u32>,
    #[serde(rename = "WhitelistZones", default, deserialize_with = "null_as_default")]
    whitelist_zones: Vec<u32>,
    #[serde(rename = "MasterWhitelist", default, deserialize_with = "null_as_default")]
    master_whitelist: Vec<WireWhitelistEntry>,
    #[serde(rename = "PurchaseLimits", default, deserialize_with = "null_as_default")]
    purchase_limits: Vec<WireLimit>,
}

#[derive(Debug, Deserialize)]
struct WireWhitelistEntry(
    String,
    String,
    #[serde(deserialize_with = "map_or_empty_array")] HashMap<String, bool>,
);

#[derive(Debug, Deserialize)]
struct WireLimit(
    u32,
    #[serde(deserialize_with = "map_or_empty_array")] HashMap<String, u32>,
);

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn map_or_empty_array<'de, D, V>(deserializer: D) -> Result<HashMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MapOrList<V> {
        Map(HashMap<String, V>),
        List(Vec<serde_json::Value>),
    }

    match Option::<MapOrList<V>>::deserialize(deserializer)? {
        None => Ok(HashMap::new()),
        Some(MapOrList::Map(map)) => Ok(map),
        Some(MapOrList::List(list)) if list.is_empty() => Ok(HashMap::new()),
        Some(MapOrList::List(_)) => Err(de::Error::custom("expected an object, found a non-empty array")),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// DECODE
// ════════════════════════════════════════════════════════════════════════════════

/// Decodes the info blob returned by the sale process.
pub fn decode_sale_info(value: &serde_json::Value) -> Result<SaleInfo, DecodeError> {
    let wire = WireInfo::deserialize(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let current_zone = wire.current_zone.unwrap_or(DEFAULT_ZONE);
    if current_zone == 0 {
        return Err(DecodeError::InvalidZone(current_zone));
    }
    if let Some(&zero) = wire.whitelist_zones.iter().find(|&&z| z == 0) {
        return Err(DecodeError::InvalidZone(zero));
    }

    let master_whitelist = wire
        .master_whitelist
        .into_iter()
        .enumerate()
        .map(|(i, WireWhitelistEntry(amount, discount, addresses))| {
            let price_base_units = amount.trim().parse::<u128>().map_err(|_| {
                DecodeError::InvalidAmount { zone: i + 1, amount: amount.clone() }
            })?;
            Ok(WhitelistEntry {
                price_base_units,
                discount_label: discount,
                addresses: addresses
                    .into_iter()
                    .filter_map(|(addr, allowed)| allowed.then_some(addr))
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;

    let purchase_limits = wire
        .purchase_limits
        .into_iter()
        .map(|WireLimit(limit, purchased_by_address)| ZoneEligibility { limit, purchased_by_address })
        .collect();

    Ok(SaleInfo {
        current_zone,
        whitelist_zones: wire.whitelist_zones,
        master_whitelist,
        purchase_limits,
    })
}

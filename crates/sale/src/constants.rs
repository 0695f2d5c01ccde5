//! Sale-wide constants.
//!
//! Values here are the defaults baked into [`SaleConfig`](crate::config::SaleConfig);
//! every one of them can be overridden from TOML or the environment.

use std::time::Duration;

/// Total number of NFTs in the collection.
pub const TOTAL_SUPPLY: u64 = 3333;

/// Zone index that is open to every address regardless of whitelist membership.
pub const OPEN_ZONE: u32 = 3;

/// Zone assumed when the info blob carries no `Current_Zone`.
pub const DEFAULT_ZONE: u32 = 1;

/// Decimal places of the payment token's smallest unit.
///
/// The latest client revision divides raw amounts by 10^12; an earlier one
/// used 10^9. Confirm against the token process before changing.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 12;

// ════════════════════════════════════════════════════════════════════════════════
// POLLING
// ════════════════════════════════════════════════════════════════════════════════

/// Poll interval while fetches succeed.
pub const BASE_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Poll interval after [`FAILURE_THRESHOLD`] consecutive failures.
pub const SLOW_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Consecutive fetch failures before the poller slows down.
pub const FAILURE_THRESHOLD: u32 = 3;

/// Zone data older than this is not trusted for purchases.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(60);

// ════════════════════════════════════════════════════════════════════════════════
// PURCHASE
// ════════════════════════════════════════════════════════════════════════════════

/// Probability that a lucky draw proceeds to the purchase call.
pub const LUCKY_DRAW_PROBABILITY: f64 = 0.2;

/// How long the success indicator stays up after a mint.
pub const SUCCESS_INDICATOR: Duration = Duration::from_millis(3000);

/// Clock tick for countdown recomputation.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

//! # mintsale-core
//!
//! Sale-side logic for a phased NFT mint: which phase or zone is active,
//! who may buy how many at what price, and how a purchase batch is driven
//! and reconciled against the sale process.
//!
//! ## Two data sources
//!
//! | Mode | Phase comes from | Quantity bound | Component |
//! |------|------------------|----------------|-----------|
//! | [`SaleMode::Schedule`] | fixed UTC windows | phase `max_mint` | [`PhaseClock`] |
//! | [`SaleMode::Zones`] | polled `Current_Zone` | zone limit − purchased | [`ZoneStateReconciler`] |
//!
//! Both write into one shared [`Session`]; the [`PurchaseController`] reads
//! it, runs the purchase calls and triggers reconciliation.
//!
//! ## Boundaries
//!
//! - [`SaleClient`] / [`SaleClientFactory`]: the sale process. See
//!   [`HttpSaleClient`] and [`MockSaleClient`].
//! - [`Wallet`]: the wallet extension.
//!
//! Nothing is persisted.

pub mod client;
pub mod clock;
pub mod config;
pub mod constants;
pub mod countdown;
pub mod error;
pub mod http_client;
pub mod info;
pub mod mock;
pub mod phase;
pub mod poll;
pub mod price;
pub mod purchase;
pub mod quantity;
pub mod reconciler;
pub mod session;
mod task;
pub mod wallet;
pub mod zone;

pub use client::{ClientError, SaleClient, SaleClientFactory};
pub use clock::{ManualClock, PhaseClock, SystemClock, TimeSource};
pub use config::{ConfigError, PurchaseConfig, SaleConfig, SaleMode};
pub use countdown::format_countdown;
pub use error::{MintError, TaskError};
pub use http_client::{HttpClientFactory, HttpSaleClient};
pub use info::{decode_sale_info, DecodeError, SaleInfo, WhitelistEntry, ZoneEligibility};
pub use mock::{MockClientFactory, MockSaleClient, MockWallet};
pub use phase::{compute_phase, CountdownStrings, Phase, PhaseBoard, PhaseSchedule, PhaseWindow};
pub use poll::{PollConfig, PollPolicy};
pub use price::TokenAmount;
pub use purchase::{FixedRandom, MintOutcome, PurchaseController, RandomSource, ThreadRandom};
pub use quantity::QuantityControl;
pub use reconciler::{FetchError, ZoneStateReconciler};
pub use session::{Session, SessionState};
pub use wallet::{ConfiguredWallet, Wallet, WalletError};
pub use zone::{ZoneInfo, ZoneRules, ZoneState};

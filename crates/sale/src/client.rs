//! # Sale Client Boundary
//!
//! The on-chain sale is driven through an opaque client. This module only
//! states the contract; purchase execution, balance checks and token
//! transfer all happen on the other side of it.
//!
//! ```text
//! ZoneStateReconciler ──get_info / query_nft_count──▶ ┐
//!                                                      │ dyn SaleClient
//! PurchaseController ──purchase_nft / lucky_draw─────▶ ┘
//! ```
//!
//! Implementations:
//! - [`HttpSaleClient`](crate::http_client::HttpSaleClient): JSON gateway.
//! - [`MockSaleClient`](crate::mock::MockSaleClient): scripted, in-memory.
//!
//! ## Contract
//!
//! - `purchase_nft` / `lucky_draw` return `Ok(true)` on success and
//!   `Ok(false)` when the sale process declined without an error.
//! - A domain failure reported by the process is [`ClientError::Purchase`].
//! - `lucky_draw` returns [`ClientError::Unsupported`] when the remote does
//!   not offer it; callers fall back to `purchase_nft`.
//! - No timeout is imposed on purchase calls.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SaleConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The sale process rejected the purchase with a reason.
    #[error("{0}")]
    Purchase(String),

    /// The call completed but reported `false`.
    #[error("{0} failed")]
    Rejected(&'static str),

    /// The operation is not offered by this client or process version.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// Network or gateway failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait SaleClient: Send + Sync {
    /// Raw info blob; decode with [`decode_sale_info`](crate::info::decode_sale_info).
    async fn get_info(&self) -> Result<serde_json::Value, ClientError>;

    /// Remaining supply.
    async fn query_nft_count(&self) -> Result<u64, ClientError>;

    async fn purchase_nft(&self) -> Result<bool, ClientError>;

    async fn lucky_draw(&self) -> Result<bool, ClientError> {
        Err(ClientError::Unsupported("luckyDraw"))
    }
}

/// Builds a [`SaleClient`] from configuration.
#[async_trait]
pub trait SaleClientFactory: Send + Sync {
    async fn create(&self, config: &SaleConfig) -> Result<Arc<dyn SaleClient>, ClientError>;
}

//! # Mint Error Taxonomy
//!
//! [`MintError`] is what the purchase flow surfaces to the user. Every
//! variant leaves the session interactive except [`MintError::ClientInit`],
//! which disables minting until the session is recreated.
//!
//! | Variant | Retryable | Surfaced |
//! |---------|-----------|----------|
//! | `WalletUnavailable` | after installing the extension | yes |
//! | `WalletConnect` | yes, by minting again | yes |
//! | `ClientInit` | no (session-fatal) | yes |
//! | `ClientNotInitialized` | after a successful connect | yes |
//! | `Purchase` / `LuckyDraw` | yes | yes, prefixed |
//! | `MintInProgress` | once the batch finishes | no (control disabled) |
//! | `MintingDisabled` | when the condition clears | yes |
//! | `InvalidQuantity` | with a quantity in range | yes |
//!
//! Fetch failures never become a `MintError`; they feed the poll policy
//! and, through staleness, turn into `MintingDisabled`.

use thiserror::Error;

/// Errors produced by [`PurchaseController::mint`](crate::purchase::PurchaseController::mint).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MintError {
    /// No wallet extension is installed.
    #[error("Arweave wallet not found. Please install Arweave wallet extension.")]
    WalletUnavailable,

    /// The user rejected the connection or the extension failed.
    #[error("Failed to connect wallet: {0}")]
    WalletConnect(String),

    /// The sale client could not be constructed.
    #[error("Failed to initialize NFT client: {0}")]
    ClientInit(String),

    /// Minting was attempted without a client.
    #[error("NFT client not initialized")]
    ClientNotInitialized,

    /// A standard purchase call failed.
    #[error("Purchase failed: {0}")]
    Purchase(String),

    /// A lucky-draw purchase call failed.
    #[error("Lucky draw failed: {0}")]
    LuckyDraw(String),

    /// The client returned an error it does not classify as a purchase failure.
    #[error("{0}")]
    Client(String),

    /// Another mint batch is still running.
    #[error("a mint is already in progress")]
    MintInProgress,

    /// Minting is currently not possible.
    #[error("minting disabled: {0}")]
    MintingDisabled(String),

    /// Requested quantity is outside `[1, max]`.
    #[error("quantity {requested} outside allowed range 1..={max}")]
    InvalidQuantity {
        /// Quantity the caller asked for.
        requested: u32,
        /// Upper bound for the active phase or zone.
        max: u32,
    },
}

impl MintError {
    /// Whether this error permanently disables minting for the session.
    #[must_use]
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::ClientInit(_))
    }
}

/// Errors starting or stopping a background task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("{0} already running")]
    AlreadyRunning(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_errors_are_prefixed_by_operation() {
        assert_eq!(
            MintError::Purchase("insufficient balance".into()).to_string(),
            "Purchase failed: insufficient balance"
        );
        assert_eq!(
            MintError::LuckyDraw("insufficient balance".into()).to_string(),
            "Lucky draw failed: insufficient balance"
        );
    }

    #[test]
    fn unclassified_client_errors_keep_their_message() {
        assert_eq!(MintError::Client("socket closed".into()).to_string(), "socket closed");
    }

    #[test]
    fn only_client_init_is_session_fatal() {
        assert!(MintError::ClientInit("bad config".into()).is_session_fatal());
        assert!(!MintError::WalletUnavailable.is_session_fatal());
        assert!(!MintError::WalletConnect("rejected".into()).is_session_fatal());
        assert!(!MintError::Purchase("x".into()).is_session_fatal());
        assert!(!MintError::MintInProgress.is_session_fatal());
    }
}

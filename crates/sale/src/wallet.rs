//! Wallet extension boundary.
//!
//! Signing is entirely the wallet's business; this crate only asks for a
//! connection with the required permissions and reads the active address.

use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    AccessAddress,
    SignTransaction,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessAddress => write!(f, "ACCESS_ADDRESS"),
            Self::SignTransaction => write!(f, "SIGN_TRANSACTION"),
        }
    }
}

/// Permissions requested before minting.
pub const REQUIRED_PERMISSIONS: [Permission; 2] =
    [Permission::AccessAddress, Permission::SignTransaction];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// No extension installed.
    #[error("wallet extension not installed")]
    Unavailable,

    /// The user declined the permission request.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Wallet: Send + Sync {
    async fn connect(&self, permissions: &[Permission]) -> Result<(), WalletError>;

    async fn active_address(&self) -> Result<String, WalletError>;
}

/// Wallet backed by an address from configuration.
///
/// Used by the operator CLI, where transactions are signed by the gateway's
/// own key management and only the address is needed locally. Without an
/// address it behaves like a missing extension.
#[derive(Debug, Default)]
pub struct ConfiguredWallet {
    address: Option<String>,
    granted: RwLock<Vec<Permission>>,
}

impl ConfiguredWallet {
    #[must_use]
    pub fn new(address: Option<String>) -> Self {
        Self {
            address: address.filter(|a| !a.trim().is_empty()),
            granted: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn granted(&self) -> Vec<Permission> {
        self.granted.read().clone()
    }
}

#[async_trait]
impl Wallet for ConfiguredWallet {
    async fn connect(&self, permissions: &[Permission]) -> Result<(), WalletError> {
        if self.address.is_none() {
            return Err(WalletError::Unavailable);
        }
        let mut granted = self.granted.write();
        for p in permissions {
            if !granted.contains(p) {
                granted.push(*p);
            }
        }
        debug!(permissions = ?permissions, "wallet connected");
        Ok(())
    }

    async fn active_address(&self) -> Result<String, WalletError> {
        if !self.granted.read().contains(&Permission::AccessAddress) {
            return Err(WalletError::Rejected("ACCESS_ADDRESS not granted".to_string()));
        }
        self.address.clone().ok_or(WalletError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn configured_wallet_connects_and_reports_address() {
        let wallet = ConfiguredWallet::new(Some("addr-1".into()));
        wallet.connect(&REQUIRED_PERMISSIONS).await.unwrap();
        assert_eq!(wallet.active_address().await.unwrap(), "addr-1");
        assert_eq!(wallet.granted(), REQUIRED_PERMISSIONS.to_vec());
    }

    #[tokio::test]
    async fn address_requires_access_permission() {
        let wallet = ConfiguredWallet::new(Some("addr-1".into()));
        assert!(matches!(wallet.active_address().await, Err(WalletError::Rejected(_))));
    }

    #[tokio::test]
    async fn missing_address_is_unavailable() {
        for address in [None, Some("  ".to_string())] {
            let wallet = ConfiguredWallet::new(address);
            assert_eq!(wallet.connect(&REQUIRED_PERMISSIONS).await, Err(WalletError::Unavailable));
        }
    }

    #[test]
    fn permission_strings() {
        let names: Vec<String> = REQUIRED_PERMISSIONS.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["ACCESS_ADDRESS", "SIGN_TRANSACTION"]);
    }
}

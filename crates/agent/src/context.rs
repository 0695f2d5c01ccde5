//! Shared command context: configuration and the sale boundary.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use mintsale_core::{
    ConfiguredWallet, HttpClientFactory, MockClientFactory, MockSaleClient, MockWallet,
    SaleClient, SaleClientFactory, SaleConfig, Wallet,
};

/// Address used by `--mock` when none is configured.
pub const MOCK_ADDRESS: &str = "mock-wallet-0000000000000000000000000000000000";

/// Remaining supply the mock sale starts with.
const MOCK_AVAILABLE: u64 = 3000;

pub struct AppContext {
    pub config: SaleConfig,
    mock: Option<Arc<MockSaleClient>>,
}

/// Config file (or defaults) overlaid with `MINTSALE_*` variables.
pub fn load_config(path: Option<&Path>) -> Result<SaleConfig> {
    let Some(p) = path else {
        return SaleConfig::from_env().context("applying MINTSALE_* environment");
    };
    let mut config =
        SaleConfig::load_from_file(p).with_context(|| format!("reading config {}", p.display()))?;
    config.apply_env().context("applying MINTSALE_* environment")?;
    Ok(config)
}

impl AppContext {
    pub fn load(path: Option<&Path>, mock: bool) -> Result<Self> {
        let config = load_config(path)?;
        Ok(Self::new(config, mock))
    }

    pub fn new(config: SaleConfig, mock: bool) -> Self {
        let mock = mock.then(|| {
            info!("using in-memory sale");
            let address = config.wallet_address.clone().unwrap_or_else(|| MOCK_ADDRESS.to_string());
            Arc::new(MockSaleClient::simulated(1, &address, MOCK_AVAILABLE))
        });
        debug!(mode = ?config.mode, gateway = %config.gateway_url, "context ready");
        Self { config, mock }
    }

    pub fn is_mock(&self) -> bool {
        self.mock.is_some()
    }

    pub fn factory(&self) -> Arc<dyn SaleClientFactory> {
        match &self.mock {
            Some(client) => Arc::new(MockClientFactory::new(Arc::clone(client))),
            None => Arc::new(HttpClientFactory),
        }
    }

    /// A client for read-only commands.
    pub async fn client(&self) -> Result<Arc<dyn SaleClient>> {
        self.factory()
            .create(&self.config)
            .await
            .context("failed to initialize sale client")
    }

    /// Address given on the command line, else the configured one.
    pub fn address(&self, explicit: Option<String>) -> Option<String> {
        explicit.or_else(|| self.config.wallet_address.clone()).or_else(|| {
            self.is_mock().then(|| MOCK_ADDRESS.to_string())
        })
    }

    pub fn wallet(&self, explicit: Option<String>) -> Arc<dyn Wallet> {
        let address = self.address(explicit);
        match (&self.mock, address) {
            (Some(_), Some(address)) => Arc::new(MockWallet::new(address)),
            (_, address) => Arc::new(ConfiguredWallet::new(address)),
        }
    }
}

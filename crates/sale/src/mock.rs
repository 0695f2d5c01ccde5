//! # In-Memory Sale Boundary
//!
//! Scripted stand-ins for the sale client, its factory and the wallet.
//! Used by the test suites and by the CLI's `--mock` mode.
//!
//! ## Scripting
//!
//! Each operation has a FIFO queue of results and an optional sticky
//! fallback. A call pops the queue front; when the queue is empty the
//! fallback is returned; with neither, the call fails with
//! `ClientError::Transport("no mock response")`.
//!
//! A successful purchase decrements the sticky remaining count, so a mock
//! built with [`MockSaleClient::simulated`] behaves like a small live sale.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::client::{ClientError, SaleClient, SaleClientFactory};
use crate::config::SaleConfig;
use crate::wallet::{Permission, Wallet, WalletError};

struct Scripted<T> {
    queue: VecDeque<Result<T, ClientError>>,
    fallback: Option<T>,
}

impl<T> Default for Scripted<T> {
    fn default() -> Self {
        Self { queue: VecDeque::new(), fallback: None }
    }
}

impl<T: Clone> Scripted<T> {
    fn next(&mut self) -> Result<T, ClientError> {
        match self.queue.pop_front() {
            Some(result) => result,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ClientError::Transport("no mock response".to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// SALE CLIENT
// ════════════════════════════════════════════════════════════════════════════════

/// Scripted [`SaleClient`].
///
/// `lucky_draw` is unsupported until [`with_lucky_draw`](Self::with_lucky_draw)
/// is called, which exercises the purchase fallback by default.
#[derive(Default)]
pub struct MockSaleClient {
    info: Mutex<Scripted<serde_json::Value>>,
    count: Mutex<Scripted<u64>>,
    purchases: Mutex<Scripted<bool>>,
    lucky: Mutex<Option<Scripted<bool>>>,
    info_calls: AtomicUsize,
    count_calls: AtomicUsize,
    purchase_calls: AtomicUsize,
    lucky_calls: AtomicUsize,
}

impl MockSaleClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A three-zone sale that accepts every purchase.
    ///
    /// Zone 1 lists `whitelisted` at 0.5 with a limit of 3, zone 2 lists
    /// nobody, zone 3 is open at 1.0 with a limit of 10.
    #[must_use]
    pub fn simulated(current_zone: u32, whitelisted: &str, available: u64) -> Self {
        let info = json!({
            "Current_Zone": current_zone,
            "WhitelistZones": [1, 2],
            "MasterWhitelist": [
                ["500000000000", "50%", { whitelisted: true }],
                ["750000000000", "25%", []],
                ["1000000000000", "", []]
            ],
            "PurchaseLimits": [[3, []], [2, []], [10, []]]
        });
        Self::new()
            .with_info(info)
            .with_count(available)
            .with_purchase_result(true)
            .with_lucky_draw(Some(true))
    }

    #[must_use]
    pub fn with_info(self, info: serde_json::Value) -> Self {
        self.info.lock().fallback = Some(info);
        self
    }

    #[must_use]
    pub fn with_count(self, available: u64) -> Self {
        self.count.lock().fallback = Some(available);
        self
    }

    #[must_use]
    pub fn with_purchase_result(self, accepted: bool) -> Self {
        self.purchases.lock().fallback = Some(accepted);
        self
    }

    /// Makes `lucky_draw` available, optionally with a sticky result.
    #[must_use]
    pub fn with_lucky_draw(self, fallback: Option<bool>) -> Self {
        *self.lucky.lock() = Some(Scripted { queue: VecDeque::new(), fallback });
        self
    }

    pub fn push_info(&self, result: Result<serde_json::Value, ClientError>) {
        self.info.lock().queue.push_back(result);
    }

    pub fn push_count(&self, result: Result<u64, ClientError>) {
        self.count.lock().queue.push_back(result);
    }

    pub fn push_purchase(&self, result: Result<bool, ClientError>) {
        self.purchases.lock().queue.push_back(result);
    }

    /// Queues a lucky-draw result. Ignored while lucky draw is unsupported.
    pub fn push_lucky_draw(&self, result: Result<bool, ClientError>) {
        if let Some(lucky) = self.lucky.lock().as_mut() {
            lucky.queue.push_back(result);
        }
    }

    pub fn set_available(&self, available: u64) {
        self.count.lock().fallback = Some(available);
    }

    #[must_use]
    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn purchase_calls(&self) -> usize {
        self.purchase_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn lucky_calls(&self) -> usize {
        self.lucky_calls.load(Ordering::SeqCst)
    }

    fn on_accepted(&self) {
        if let Some(available) = self.count.lock().fallback.as_mut() {
            *available = available.saturating_sub(1);
        }
    }
}

#[async_trait]
impl SaleClient for MockSaleClient {
    async fn get_info(&self) -> Result<serde_json::Value, ClientError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.info.lock().next()
    }

    async fn query_nft_count(&self) -> Result<u64, ClientError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.count.lock().next()
    }

    async fn purchase_nft(&self) -> Result<bool, ClientError> {
        self.purchase_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.purchases.lock().next();
        if matches!(result, Ok(true)) {
            self.on_accepted();
        }
        result
    }

    async fn lucky_draw(&self) -> Result<bool, ClientError> {
        let result = match self.lucky.lock().as_mut() {
            Some(lucky) => {
                self.lucky_calls.fetch_add(1, Ordering::SeqCst);
                lucky.next()
            }
            None => return Err(ClientError::Unsupported("luckyDraw")),
        };
        if matches!(result, Ok(true)) {
            self.on_accepted();
        }
        result
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// FACTORY
// ════════════════════════════════════════════════════════════════════════════════

/// Hands out a shared [`MockSaleClient`], or fails every time.
pub struct MockClientFactory {
    client: Option<Arc<MockSaleClient>>,
    error: String,
    create_calls: AtomicUsize,
}

impl MockClientFactory {
    #[must_use]
    pub fn new(client: Arc<MockSaleClient>) -> Self {
        Self { client: Some(client), error: String::new(), create_calls: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self { client: None, error: reason.into(), create_calls: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SaleClientFactory for MockClientFactory {
    async fn create(&self, _config: &SaleConfig) -> Result<Arc<dyn SaleClient>, ClientError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        match &self.client {
            Some(client) => Ok(Arc::clone(client) as Arc<dyn SaleClient>),
            None => Err(ClientError::Transport(self.error.clone())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// WALLET
// ════════════════════════════════════════════════════════════════════════════════

/// Wallet with a fixed address and optionally scripted connect failures.
#[derive(Default)]
pub struct MockWallet {
    address: Option<String>,
    connect_errors: Mutex<VecDeque<WalletError>>,
    connect_calls: AtomicUsize,
    last_permissions: Mutex<Vec<Permission>>,
}

impl MockWallet {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: Some(address.into()), ..Self::default() }
    }

    /// No extension installed.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn push_connect_error(&self, error: WalletError) {
        self.connect_errors.lock().push_back(error);
    }

    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_permissions(&self) -> Vec<Permission> {
        self.last_permissions.lock().clone()
    }
}

#[async_trait]
impl Wallet for MockWallet {
    async fn connect(&self, permissions: &[Permission]) -> Result<(), WalletError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.address.is_none() {
            return Err(WalletError::Unavailable);
        }
        if let Some(error) = self.connect_errors.lock().pop_front() {
            return Err(error);
        }
        *self.last_permissions.lock() = permissions.to_vec();
        Ok(())
    }

    async fn active_address(&self) -> Result<String, WalletError> {
        self.address.clone().ok_or(WalletError::Unavailable)
    }
}

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<MockSaleClient>();
        assert_send_sync::<MockClientFactory>();
        assert_send_sync::<MockWallet>();
    }
    let _ = check;
};

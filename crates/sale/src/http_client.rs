//! JSON gateway client for the sale process.
//!
//! | Call | Route |
//! |------|-------|
//! | `get_info` | `GET {base}/{sale}/info` |
//! | `query_nft_count` | `GET {base}/{sale}/count` |
//! | `purchase_nft` | `POST {base}/{sale}/purchase` |
//! | `lucky_draw` | `POST {base}/{sale}/lucky-draw` (404 → unsupported) |
//!
//! Read queries carry the configured timeout. Purchase calls carry none:
//! a purchase may be waiting on the user's signature.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ClientError, SaleClient, SaleClientFactory};
use crate::config::SaleConfig;

/// Body returned by the purchase routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReply {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountReply {
    available: u64,
}

#[derive(Debug, Serialize)]
struct PurchaseRequest<'a> {
    payment_token: &'a str,
    buyer: Option<&'a str>,
}

#[derive(Clone)]
pub struct HttpSaleClient {
    base: String,
    payment_token: String,
    buyer: Option<String>,
    query_timeout: Duration,
    client: Client,
}

impl HttpSaleClient {
    pub fn new(config: &SaleConfig) -> Result<Self, ClientError> {
        if config.sale_process_id.trim().is_empty() {
            return Err(ClientError::Transport("sale process id is not configured".to_string()));
        }
        if config.payment_token_process_id.trim().is_empty() {
            return Err(ClientError::Transport(
                "payment token process id is not configured".to_string(),
            ));
        }
        let gateway = Url::parse(&config.gateway_url)
            .map_err(|e| ClientError::Transport(format!("invalid gateway url: {e}")))?;
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            base: format!("{}/{}", gateway.as_str().trim_end_matches('/'), config.sale_process_id),
            payment_token: config.payment_token_process_id.clone(),
            buyer: config.wallet_address.clone(),
            query_timeout: config.query_timeout,
            client,
        })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, route: &str) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.base, route);
        let r = self
            .client
            .get(&url)
            .timeout(self.query_timeout)
            .send()
            .await
            .map_err(transport)?;
        let status = r.status();
        if !status.is_success() {
            let s = r.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!("{route} error: {status} {s}")));
        }
        r.json::<T>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn post_purchase(&self, route: &'static str) -> Result<bool, ClientError> {
        let url = format!("{}/{}", self.base, route);
        let body = PurchaseRequest { payment_token: &self.payment_token, buyer: self.buyer.as_deref() };
        debug!(url = %url, "purchase request");
        let r = self.client.post(&url).json(&body).send().await.map_err(transport)?;
        let status = r.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::Unsupported(route));
        }
        if !status.is_success() {
            let s = r.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!("{route} error: {status} {s}")));
        }
        let reply = r
            .json::<PurchaseReply>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        interpret_reply(reply)
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

/// `error` present is a domain failure regardless of `success`.
fn interpret_reply(reply: PurchaseReply) -> Result<bool, ClientError> {
    match reply.error {
        Some(message) if !message.is_empty() => Err(ClientError::Purchase(message)),
        _ => Ok(reply.success),
    }
}

#[async_trait]
impl SaleClient for HttpSaleClient {
    async fn get_info(&self) -> Result<serde_json::Value, ClientError> {
        self.get_json("info").await
    }

    async fn query_nft_count(&self) -> Result<u64, ClientError> {
        self.get_json::<CountReply>("count").await.map(|c| c.available)
    }

    async fn purchase_nft(&self) -> Result<bool, ClientError> {
        self.post_purchase("purchase").await
    }

    async fn lucky_draw(&self) -> Result<bool, ClientError> {
        self.post_purchase("lucky-draw").await
    }
}

/// Builds [`HttpSaleClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

#[async_trait]
impl SaleClientFactory for HttpClientFactory {
    async fn create(&self, config: &SaleConfig) -> Result<Arc<dyn SaleClient>, ClientError> {
        Ok(Arc::new(HttpSaleClient::new(config)?))
    }
}

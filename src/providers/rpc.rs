//! RPC Client Module - Chain data for error enrichment
//!
//! Minimal JSON-RPC client used by the context enricher:
//! 1. Primary URL from configuration, public fallback per chain
//! 2. Exponential backoff with jitter on retryable failures
//! 3. User-Agent header and gzip compression
//!
//! Enrichment sits on an error path, so retry budgets are kept short.

use alloy_primitives::U256;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::enricher::ChainDataSource;
use crate::models::config::SentinelConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{get_public_rpc_fallback, USER_AGENT as USER_AGENT_CONST};

/// Base retry delay in milliseconds
pub const BASE_RETRY_MS: u64 = 250;

/// Maximum retry delay in milliseconds
pub const MAX_RETRY_MS: u64 = 2000;

/// Attempts per endpoint
pub const MAX_ATTEMPTS: u32 = 3;

/// Jitter percentage applied to each delay
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC chain client with retry and fallback
#[derive(Clone)]
pub struct RpcChainClient {
    primary_url: String,
    fallback_url: Option<String>,
    client: reqwest::Client,
    chain_id: u64,
}

impl RpcChainClient {
    /// Create a client for `chain_id`; the public fallback is added when it differs
    pub fn new(chain_id: u64, primary_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let primary_url = primary_url.into();
        let fallback_url = get_public_rpc_fallback(chain_id)
            .filter(|url| *url != primary_url)
            .map(String::from);

        Ok(Self {
            primary_url,
            fallback_url,
            client: Self::build_client(timeout)?,
            chain_id,
        })
    }

    /// Build from configuration, `None` when no endpoint is known for the chain
    pub fn from_config(config: &SentinelConfig) -> AppResult<Option<Self>> {
        match config.effective_rpc_url() {
            Some(url) => {
                let client = Self::new(config.chain_id, url, config.rpc_timeout)?;
                info!("🔗 RPC client ready for chain {} ({})", config.chain_id, client.masked_url());
                Ok(Some(client))
            }
            None => {
                warn!("⚠️ No RPC endpoint for chain {}, enrichment runs offline", config.chain_id);
                Ok(None)
            }
        }
    }

    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::with_source(ErrorCode::RpcConnectionFailed, "Failed to build HTTP client", e))
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Primary URL with any path-embedded API key hidden
    pub fn masked_url(&self) -> String {
        mask_url(&self.primary_url)
    }

    /// JSON-RPC call: primary with retries, then fallback
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let primary_err = match self.call_with_retry(&self.primary_url, &payload).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                warn!("⚠️ Primary RPC failed for {}: {}", method, e);
                e
            }
        };

        if let Some(ref fallback) = self.fallback_url {
            info!("🔄 Trying fallback RPC for chain {}", self.chain_id);
            return self.call_with_retry(fallback, &payload).await;
        }

        Err(primary_err)
    }

    async fn call_with_retry<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> AppResult<T> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                debug!("⏳ Retry {}/{} after {}ms", attempt + 1, MAX_ATTEMPTS, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.execute_call::<T>(url, payload).await {
                Ok(result) => return Ok(result),
                Err(e) if e.code.is_retryable() && attempt + 1 < MAX_ATTEMPTS => {
                    if e.code == ErrorCode::RpcRateLimited {
                        warn!("⏳ Rate limited (HTTP 429), backing off");
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute_call<T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> AppResult<T> {
        let response = self.client.post(url).json(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::rpc_timeout(format!("Request timed out: {}", e))
            } else {
                AppError::rpc_connection_failed(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::rpc_rate_limited());
        }
        if status.is_server_error() {
            return Err(AppError::rpc_connection_failed(format!("HTTP error: {}", status)));
        }
        if !status.is_success() {
            return Err(AppError::rpc_error(format!("HTTP error: {}", status)));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::rpc_invalid_response(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(AppError::rpc_error(format!(
                "RPC error: {} (code: {})",
                error.message, error.code
            )));
        }

        body.result
            .ok_or_else(|| AppError::rpc_invalid_response("No result in response"))
    }
}

#[async_trait]
impl ChainDataSource for RpcChainClient {
    async fn gas_price(&self) -> AppResult<U256> {
        let hex: String = self.call("eth_gasPrice", serde_json::json!([])).await?;
        parse_quantity(&hex)
    }

    async fn balance(&self, address: &str) -> AppResult<U256> {
        let hex: String = self
            .call("eth_getBalance", serde_json::json!([address, "latest"]))
            .await?;
        parse_quantity(&hex)
    }
}

/// Delay before retry `attempt` (1-based): exponential, capped, ±jitter
pub fn backoff_delay(attempt: u32) -> u64 {
    let base = BASE_RETRY_MS.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = base.min(MAX_RETRY_MS);
    let jitter_range = (capped * RETRY_JITTER_PERCENT / 100) as i64;
    let jitter: i64 = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
    (capped as i64 + jitter).max(50) as u64
}

/// Parse a JSON-RPC hex quantity (`0x...`)
pub fn parse_quantity(hex: &str) -> AppResult<U256> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .ok_or_else(|| AppError::rpc_invalid_response(format!("Not a hex quantity: {}", hex)))?;

    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(digits, 16)
        .map_err(|e| AppError::rpc_invalid_response(format!("Invalid quantity {}: {}", hex, e)))
}

fn mask_url(url: &str) -> String {
    match url.split_once("/v2/") {
        Some((base, _)) => format!("{}/v2/***HIDDEN***", base),
        None => url.to_string(),
    }
}

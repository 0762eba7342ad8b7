//! Configuration module for Contract Sentinel
//!
//! Defaults come from `utils::constants`; every value can be overridden
//! from the environment.

use std::time::Duration;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{
    get_network_name, get_public_rpc_fallback, CHAIN_ID_ETHEREUM, DEFAULT_AUDIT_TIMEOUT_SECS,
    DEFAULT_AUDIT_URL, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_TELEMETRY_CAPACITY,
};

/// Runtime configuration shared by the binaries
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// API bind host
    pub host: String,
    /// API bind port
    pub port: u16,
    /// Max events kept by the telemetry ring buffer
    pub telemetry_capacity: usize,
    /// Base URL of the security audit backend
    pub audit_url: String,
    /// Timeout for audit calls
    pub audit_timeout: Duration,
    /// Chain used for context enrichment
    pub chain_id: u64,
    /// Primary JSON-RPC endpoint (falls back to the public one for the chain)
    pub rpc_url: Option<String>,
    /// Timeout for RPC calls
    pub rpc_timeout: Duration,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            telemetry_capacity: DEFAULT_TELEMETRY_CAPACITY,
            audit_url: DEFAULT_AUDIT_URL.to_string(),
            audit_timeout: Duration::from_secs(DEFAULT_AUDIT_TIMEOUT_SECS),
            chain_id: CHAIN_ID_ETHEREUM,
            rpc_url: None,
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
        }
    }
}

impl SentinelConfig {
    /// Load configuration from environment variables on top of the defaults
    ///
    /// - `SENTINEL_HOST`, `PORT` or `SENTINEL_PORT`
    /// - `SENTINEL_TELEMETRY_CAPACITY`
    /// - `SENTINEL_AUDIT_URL`
    /// - `SENTINEL_CHAIN_ID`, `SENTINEL_RPC_URL`
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("SENTINEL_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("PORT").or_else(|| lookup("SENTINEL_PORT")) {
            config.port = port
                .parse()
                .map_err(|_| AppError::invalid_config(format!("Invalid port: {}", port)))?;
        }

        if let Some(capacity) = lookup("SENTINEL_TELEMETRY_CAPACITY") {
            config.telemetry_capacity = capacity
                .parse()
                .ok()
                .filter(|c: &usize| *c > 0)
                .ok_or_else(|| {
                    AppError::invalid_config(format!(
                        "Telemetry capacity must be a positive integer, got {}",
                        capacity
                    ))
                })?;
        }

        if let Some(url) = lookup("SENTINEL_AUDIT_URL") {
            config.audit_url = url.trim_end_matches('/').to_string();
        }

        if let Some(chain_id) = lookup("SENTINEL_CHAIN_ID") {
            config.chain_id = chain_id
                .parse()
                .map_err(|_| AppError::invalid_config(format!("Invalid chain id: {}", chain_id)))?;
            if get_network_name(config.chain_id).is_none() {
                warn!("⚠️ Chain {} has no known network name", config.chain_id);
            }
        }

        config.rpc_url = lookup("SENTINEL_RPC_URL").filter(|u| !u.is_empty());

        info!(
            "⚙️ Config loaded: chain {} | telemetry capacity {} | audit backend {}",
            config.chain_id, config.telemetry_capacity, config.audit_url
        );

        Ok(config)
    }

    /// RPC endpoint for enrichment, explicit URL first then public fallback
    pub fn effective_rpc_url(&self) -> Option<String> {
        self.rpc_url
            .clone()
            .or_else(|| get_public_rpc_fallback(self.chain_id).map(String::from))
    }
}

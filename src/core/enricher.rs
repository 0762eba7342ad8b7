//! Error Context Enricher
//! Gathers network name, gas price and wallet balance for error messages
//!
//! Enrichment degrades instead of failing: any chain lookup that errors is
//! logged and replaced with a `?` placeholder.

use alloy_primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::errors::AppResult;
use crate::models::smart_error::ErrorContext;
use crate::utils::constants::{format_ether, get_network_name, wei_to_eth, wei_to_gwei};

const UNKNOWN_GAS_PRICE: &str = "? gwei";
const UNKNOWN_BALANCE: &str = "? ETH";

/// Source of live chain data (gas price, balances), values in wei
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    async fn gas_price(&self) -> AppResult<U256>;
    async fn balance(&self, address: &str) -> AppResult<U256>;
}

/// What the caller knows when an error happens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRequest {
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub user_address: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Total cost of the attempted transaction in wei
    #[serde(default)]
    pub gas_estimate: Option<U256>,
}

/// Builds and post-processes `ErrorContext` values
pub struct ErrorContextEnricher;

impl ErrorContextEnricher {
    /// Build a context from the request, querying `client` when given
    pub async fn build(
        request: ContextRequest,
        client: Option<&dyn ChainDataSource>,
    ) -> ErrorContext {
        let mut context = ErrorContext {
            template: request.template,
            features: request.features,
            chain_id: request.chain_id,
            network: request.chain_id.map(network_name),
            user_address: request.user_address,
            estimated_cost: request
                .gas_estimate
                .map(|wei| format!("{} ETH", format_ether(wei))),
            ..Default::default()
        };

        if let Some(client) = client {
            if context.chain_id.is_some() {
                context.gas_price = Some(match client.gas_price().await {
                    Ok(wei) => format!("{:.2} gwei", wei_to_gwei(wei)),
                    Err(e) => {
                        warn!("⚠️ Gas price lookup failed: {}", e);
                        UNKNOWN_GAS_PRICE.to_string()
                    }
                });
            }

            if let Some(address) = context.user_address.as_deref() {
                context.user_balance = Some(match client.balance(address).await {
                    Ok(wei) => format!("{:.4} ETH", wei_to_eth(wei)),
                    Err(e) => {
                        warn!("⚠️ Balance lookup failed for {}: {}", mask_address(address), e);
                        UNKNOWN_BALANCE.to_string()
                    }
                });
            }
        }

        debug!(
            network = ?context.network,
            gas_price = ?context.gas_price,
            "🔎 Error context built"
        );

        context
    }

    /// Shallow merge: every field set in `extra` replaces the one in `context`
    pub fn enrich(context: ErrorContext, extra: ErrorContext) -> ErrorContext {
        ErrorContext {
            template: extra.template.or(context.template),
            features: extra.features.or(context.features),
            chain_id: extra.chain_id.or(context.chain_id),
            network: extra.network.or(context.network),
            user_balance: extra.user_balance.or(context.user_balance),
            gas_price: extra.gas_price.or(context.gas_price),
            estimated_cost: extra.estimated_cost.or(context.estimated_cost),
            user_address: extra.user_address.or(context.user_address),
            contract_address: extra.contract_address.or(context.contract_address),
        }
    }

    /// Copy safe to log or persist (wallet address masked)
    pub fn sanitize(context: &ErrorContext) -> ErrorContext {
        let mut sanitized = context.clone();
        sanitized.user_address = context.user_address.as_deref().map(mask_address);
        sanitized
    }
}

/// Human name of a chain, `"Network <id>"` when unknown
pub fn network_name(chain_id: u64) -> String {
    get_network_name(chain_id)
        .map(String::from)
        .unwrap_or_else(|| format!("Network {}", chain_id))
}

/// `first6...last4`; strings too short to mask are fully hidden
pub fn mask_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::AppError;

    struct MockChain {
        fail: bool,
    }

    #[async_trait]
    impl ChainDataSource for MockChain {
        async fn gas_price(&self) -> AppResult<U256> {
            if self.fail {
                return Err(AppError::rpc_timeout("mock timeout"));
            }
            Ok(U256::from(25_500_000_000u64))
        }

        async fn balance(&self, _address: &str) -> AppResult<U256> {
            if self.fail {
                return Err(AppError::rpc_connection_failed("mock down"));
            }
            Ok(U256::from(100_000_000_000_000_000u128))
        }
    }

    const ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn request() -> ContextRequest {
        ContextRequest {
            template: Some("ERC20".to_string()),
            features: None,
            user_address: Some(ADDRESS.to_string()),
            chain_id: Some(137),
            gas_estimate: Some(U256::from(5_000_000_000_000_000_000u128)),
        }
    }

    #[tokio::test]
    async fn test_build_with_client() {
        let chain = MockChain { fail: false };
        let ctx = ErrorContextEnricher::build(request(), Some(&chain)).await;
        assert_eq!(ctx.network.as_deref(), Some("Polygon"));
        assert_eq!(ctx.gas_price.as_deref(), Some("25.50 gwei"));
        assert_eq!(ctx.user_balance.as_deref(), Some("0.1000 ETH"));
        assert_eq!(ctx.estimated_cost.as_deref(), Some("5 ETH"));
    }

    #[tokio::test]
    async fn test_build_degrades_on_failure() {
        let chain = MockChain { fail: true };
        let ctx = ErrorContextEnricher::build(request(), Some(&chain)).await;
        assert_eq!(ctx.gas_price.as_deref(), Some("? gwei"));
        assert_eq!(ctx.user_balance.as_deref(), Some("? ETH"));
        assert_eq!(ctx.network.as_deref(), Some("Polygon"));
    }

    #[tokio::test]
    async fn test_build_without_client() {
        let mut req = request();
        req.chain_id = Some(424242);
        let ctx = ErrorContextEnricher::build(req, None).await;
        assert_eq!(ctx.network.as_deref(), Some("Network 424242"));
        assert!(ctx.gas_price.is_none());
        assert!(ctx.user_balance.is_none());
    }

    #[test]
    fn test_enrich_overrides() {
        let base = ErrorContext {
            network: Some("Ethereum".to_string()),
            template: Some("ERC20".to_string()),
            ..Default::default()
        };
        let extra = ErrorContext {
            network: Some("Base".to_string()),
            contract_address: Some("0xabc".to_string()),
            ..Default::default()
        };
        let merged = ErrorContextEnricher::enrich(base, extra);
        assert_eq!(merged.network.as_deref(), Some("Base"));
        assert_eq!(merged.template.as_deref(), Some("ERC20"));
        assert_eq!(merged.contract_address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_sanitize_masks_address() {
        let ctx = ErrorContext {
            user_address: Some(ADDRESS.to_string()),
            network: Some("Ethereum".to_string()),
            ..Default::default()
        };
        let clean = ErrorContextEnricher::sanitize(&ctx);
        assert_eq!(clean.user_address.as_deref(), Some("0x1234...5678"));
        assert_eq!(clean.network, ctx.network);
        assert_eq!(ctx.user_address.as_deref(), Some(ADDRESS));
    }

    #[test]
    fn test_mask_short_address() {
        assert_eq!(mask_address("0xabc"), "*****");
    }
}

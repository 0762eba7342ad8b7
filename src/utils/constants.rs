//! Constants Module
//!
//! Chain metadata, defaults and unit conversions shared across the crate.

use alloy_primitives::U256;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "ContractSentinel";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outgoing HTTP requests
pub const USER_AGENT: &str = concat!("ContractSentinel/", env!("CARGO_PKG_VERSION"));

/// Telemetry export format version
pub const TELEMETRY_EXPORT_VERSION: &str = "1.0";

/// Events kept in the telemetry ring buffer unless configured otherwise
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 1000;

/// Default stats window: 24h in milliseconds
pub const DEFAULT_STATS_WINDOW_MS: i64 = 86_400_000;

/// Default audit backend base URL
pub const DEFAULT_AUDIT_URL: &str = "http://localhost:3004";

/// Path prefix of the troubleshooting docs
pub const HELP_URL_BASE: &str = "/docs/troubleshooting";

// ============================================
// RPC CONSTANTS
// ============================================

/// Default timeout for RPC requests (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default timeout for audit requests (seconds); the backend runs Slither
pub const DEFAULT_AUDIT_TIMEOUT_SECS: u64 = 120;

// ============================================
// CHAIN IDS
// ============================================

pub const CHAIN_ID_ETHEREUM: u64 = 1;
pub const CHAIN_ID_OPTIMISM: u64 = 10;
pub const CHAIN_ID_BSC: u64 = 56;
pub const CHAIN_ID_GNOSIS: u64 = 100;
pub const CHAIN_ID_POLYGON: u64 = 137;
pub const CHAIN_ID_HYPEREVM: u64 = 999;
pub const CHAIN_ID_BASE: u64 = 8453;
pub const CHAIN_ID_HARDHAT: u64 = 31337;
pub const CHAIN_ID_ARBITRUM: u64 = 42161;
pub const CHAIN_ID_CELO: u64 = 42220;
pub const CHAIN_ID_AVALANCHE: u64 = 43114;
pub const CHAIN_ID_LINEA: u64 = 59144;
pub const CHAIN_ID_SCROLL: u64 = 534352;
pub const CHAIN_ID_ZORA: u64 = 7777777;

/// Human network name shown in error messages
pub fn get_network_name(chain_id: u64) -> Option<&'static str> {
    let name = match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_POLYGON => "Polygon",
        CHAIN_ID_ARBITRUM => "Arbitrum",
        CHAIN_ID_OPTIMISM => "Optimism",
        CHAIN_ID_BSC => "BSC",
        CHAIN_ID_AVALANCHE => "Avalanche",
        CHAIN_ID_BASE => "Base",
        CHAIN_ID_GNOSIS => "Gnosis",
        CHAIN_ID_SCROLL => "Scroll",
        CHAIN_ID_LINEA => "Linea",
        CHAIN_ID_CELO => "Celo",
        CHAIN_ID_ZORA => "Zora",
        CHAIN_ID_HYPEREVM => "HyperEVM",
        CHAIN_ID_HARDHAT => "Hardhat Local",
        _ => return None,
    };
    Some(name)
}

// ============================================
// PUBLIC RPC FALLBACKS
// ============================================

/// Get public RPC fallback URL for a chain
pub fn get_public_rpc_fallback(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("https://eth.llamarpc.com"),
        CHAIN_ID_BSC => Some("https://bsc-dataseed.binance.org"),
        CHAIN_ID_POLYGON => Some("https://polygon-rpc.com"),
        CHAIN_ID_ARBITRUM => Some("https://arb1.arbitrum.io/rpc"),
        CHAIN_ID_OPTIMISM => Some("https://mainnet.optimism.io"),
        CHAIN_ID_AVALANCHE => Some("https://api.avax.network/ext/bc/C/rpc"),
        CHAIN_ID_BASE => Some("https://mainnet.base.org"),
        CHAIN_ID_GNOSIS => Some("https://rpc.gnosischain.com"),
        CHAIN_ID_SCROLL => Some("https://rpc.scroll.io"),
        CHAIN_ID_LINEA => Some("https://rpc.linea.build"),
        CHAIN_ID_CELO => Some("https://forno.celo.org"),
        CHAIN_ID_ZORA => Some("https://rpc.zora.energy"),
        CHAIN_ID_HARDHAT => Some("http://127.0.0.1:8545"),
        _ => None,
    }
}

// ============================================
// CONVERSION UTILITIES
// ============================================

/// Convert wei to ETH (or native token), lossy
#[inline]
pub fn wei_to_eth(wei: U256) -> f64 {
    let wei_u128: u128 = wei.try_into().unwrap_or(u128::MAX);
    wei_u128 as f64 / 1e18
}

/// Convert wei to gwei, lossy
#[inline]
pub fn wei_to_gwei(wei: U256) -> f64 {
    let wei_u128: u128 = wei.try_into().unwrap_or(u128::MAX);
    wei_u128 as f64 / 1e9
}

/// Exact decimal ether string with trailing zeros trimmed ("5", "0.05")
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(1_000_000_000_000_000_000u128);
    let whole = wei / unit;
    let frac = wei % unit;

    if frac.is_zero() {
        return whole.to_string();
    }

    let frac = format!("{:0>18}", frac.to_string());
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Current unix time in milliseconds
#[inline]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

//! Contract Sentinel API Server
//!
//! REST API for Solidity source scanning and smart error handling
//!
//! Usage:
//!   cargo run --bin sentinel_api
//!
//! Environment:
//!   PORT / SENTINEL_PORT        - Server port (default: 8080)
//!   SENTINEL_HOST               - Server host (default: 0.0.0.0)
//!   SENTINEL_CHAIN_ID           - Chain used for enrichment (default: 1)
//!   SENTINEL_RPC_URL            - JSON-RPC endpoint (default: public RPC)
//!   SENTINEL_TELEMETRY_CAPACITY - Error log size (default: 1000)
//!   RUST_LOG                    - Log level (default: info)

use contract_sentinel::api::{create_router, start_cleanup_task, AppState};
use contract_sentinel::core::enricher::ChainDataSource;
use contract_sentinel::providers::rpc::RpcChainClient;
use contract_sentinel::utils::constants::{get_network_name, APP_VERSION};
use contract_sentinel::{ErrorTelemetry, SentinelConfig, TracingSink};

use eyre::eyre;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = SentinelConfig::from_env().map_err(|e| eyre!("{}", e))?;

    let telemetry = Arc::new(ErrorTelemetry::new(config.telemetry_capacity));
    telemetry.add_sink(Arc::new(TracingSink));

    let chain: Option<Arc<dyn ChainDataSource>> = match RpcChainClient::from_config(&config) {
        Ok(Some(client)) => Some(Arc::new(client)),
        Ok(None) => None,
        Err(e) => {
            warn!("⚠️ RPC client unavailable: {}", e);
            None
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let network = get_network_name(config.chain_id).unwrap_or("unknown network");
    let state = Arc::new(AppState::new(config, telemetry.clone(), chain));

    start_cleanup_task(state.rate_limiter.clone());
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    info!("🛡️ Contract Sentinel API v{} starting on http://{}", APP_VERSION, addr);
    info!("🔗 Enrichment network: {}", network);
    info!("Endpoints:");
    info!("  POST   /v1/scan                - Full source analysis");
    info!("  POST   /v1/scan/quick          - Quick pre-publication check");
    info!("  POST   /v1/errors/classify     - Classify and track an error");
    info!("  POST   /v1/errors/:id/resolve  - Record a resolution");
    info!("  GET    /v1/errors/stats        - Error statistics");
    info!("  GET    /v1/errors/top          - Most frequent errors");
    info!("  GET    /v1/errors/export       - Telemetry export");
    info!("  DELETE /v1/errors              - Clear telemetry");
    info!("  GET    /v1/health              - Health check");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received");
    let stats = telemetry.stats(contract_sentinel::utils::constants::DEFAULT_STATS_WINDOW_MS);
    info!(
        "📊 Errors tracked: {} (resolution rate {:.1}%)",
        stats.total, stats.resolution_rate
    );
    info!("👋 Contract Sentinel API shutdown complete");

    Ok(())
}

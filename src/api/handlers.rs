//! API Request Handlers

use axum::{
    extract::{Json, Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::middleware::RateLimiter;
use super::types::*;
use crate::core::enricher::ChainDataSource;
use crate::core::handler::SmartErrorHandler;
use crate::core::risk_score::RiskScore;
use crate::core::scanner::PatternScanner;
use crate::models::config::SentinelConfig;
use crate::models::errors::AppError;
use crate::models::smart_error::ClassifiedError;
use crate::models::types::QuickCheck;
use crate::utils::constants::{APP_VERSION, DEFAULT_STATS_WINDOW_MS};
use crate::utils::report::format_report;
use crate::utils::telemetry::{ErrorStats, ErrorTelemetry, TopError, TrackOptions};

const DEFAULT_TOP_ERRORS: usize = 5;
const MAX_TOP_ERRORS: usize = 100;

/// Shared application state
pub struct AppState {
    pub config: SentinelConfig,
    pub telemetry: Arc<ErrorTelemetry>,
    pub errors: SmartErrorHandler,
    pub rate_limiter: Arc<RateLimiter>,
    pub rpc_enabled: bool,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: SentinelConfig,
        telemetry: Arc<ErrorTelemetry>,
        chain: Option<Arc<dyn ChainDataSource>>,
    ) -> Self {
        let rpc_enabled = chain.is_some();
        let errors = match chain {
            Some(chain) => SmartErrorHandler::new(telemetry.clone()).with_chain_source(chain),
            None => SmartErrorHandler::new(telemetry.clone()),
        };

        Self {
            config,
            telemetry,
            errors,
            rate_limiter: Arc::new(RateLimiter::default()),
            rpc_enabled,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        chain_id: state.config.chain_id,
        rpc_enabled: state.rpc_enabled,
        telemetry_events: state.telemetry.len(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Source Scanning
// ============================================

pub async fn scan_source(Json(req): Json<ScanRequest>) -> ApiResult<ScanData> {
    let start = Instant::now();

    if req.source_code.trim().is_empty() {
        return Err(reject(AppError::bad_request("sourceCode is empty"), start));
    }

    let analysis = PatternScanner::analyze(&req.source_code, &req.contract_name);
    let score = RiskScore::from_findings(&analysis.findings);
    let report = req.include_report.then(|| format_report(&analysis));

    info!(
        contract = %analysis.contract_name,
        score = analysis.overall_score,
        findings = analysis.findings.len(),
        "🔍 Source scanned"
    );

    let data = ScanData {
        color: score.color_code().to_string(),
        analysis,
        score,
        report,
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

pub async fn quick_scan(Json(req): Json<QuickScanRequest>) -> Json<ApiResponse<QuickCheck>> {
    let start = Instant::now();
    let result = PatternScanner::quick_check(&req.source_code);
    Json(ApiResponse::success(result, elapsed_ms(start)))
}

// ============================================
// Smart Errors
// ============================================

pub async fn classify_error(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ClassifyRequest>,
) -> ApiResult<ClassifiedError> {
    let start = Instant::now();

    if req.message.trim().is_empty() {
        return Err(reject(AppError::bad_request("message is empty"), start));
    }

    let options = TrackOptions {
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        url: req.url,
        ..Default::default()
    };

    let error = state
        .errors
        .handle(&req.message, req.context, req.extra, options)
        .await;

    Ok(Json(ApiResponse::success(error, elapsed_ms(start))))
}

pub async fn resolve_error(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ResolveRequest>,
) -> Json<ApiResponse<ResolveData>> {
    let start = Instant::now();
    let resolved = state.errors.resolve(&id, req.method);
    Json(ApiResponse::success(ResolveData { id, resolved }, elapsed_ms(start)))
}

pub async fn error_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<ErrorStats> {
    let start = Instant::now();

    let window = query.window_ms.unwrap_or(DEFAULT_STATS_WINDOW_MS);
    if window <= 0 {
        return Err(reject(AppError::bad_request("windowMs must be positive"), start));
    }

    Ok(Json(ApiResponse::success(
        state.telemetry.stats(window),
        elapsed_ms(start),
    )))
}

pub async fn top_errors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopErrorsQuery>,
) -> Json<ApiResponse<Vec<TopError>>> {
    let start = Instant::now();
    let limit = query.limit.unwrap_or(DEFAULT_TOP_ERRORS).min(MAX_TOP_ERRORS);
    Json(ApiResponse::success(
        state.telemetry.top_errors(limit),
        elapsed_ms(start),
    ))
}

/// Raw export document (not wrapped in the envelope)
pub async fn export_errors(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiRejection> {
    let start = Instant::now();
    let body = state.telemetry.export().map_err(|e| reject(e, start))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

pub async fn clear_errors(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ClearData>> {
    let start = Instant::now();
    let cleared = state.telemetry.len();
    state.telemetry.clear();
    info!("🧹 Telemetry cleared ({} events)", cleared);
    Json(ApiResponse::success(ClearData { cleared }, elapsed_ms(start)))
}

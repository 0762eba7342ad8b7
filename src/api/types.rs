//! API Request/Response Types

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::core::enricher::ContextRequest;
use crate::core::risk_score::RiskScore;
use crate::models::errors::{AppError, ErrorCode};
use crate::models::smart_error::{ErrorContext, ResolutionMethod};
use crate::models::types::SecurityAnalysis;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: ErrorCode::ApiRateLimited.as_str().to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

/// Error half of every handler result
pub type ApiRejection = (StatusCode, Json<ApiResponse<()>>);

/// Handler result with the standard envelope
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiRejection>;

/// Turn an `AppError` into an enveloped HTTP error
pub fn reject(err: AppError, start: Instant) -> ApiRejection {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(&err), elapsed_ms(start))),
    )
}

pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

// ============================================
// Source Scanning
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub source_code: String,
    #[serde(default = "default_contract_name")]
    pub contract_name: String,
    /// Include the Markdown report in the response
    #[serde(default)]
    pub include_report: bool,
}

fn default_contract_name() -> String {
    "Contract".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanData {
    pub analysis: SecurityAnalysis,
    pub score: RiskScore,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickScanRequest {
    pub source_code: String,
}

// ============================================
// Smart Errors
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    /// Raw error message as caught by the client
    pub message: String,
    #[serde(default)]
    pub context: ContextRequest,
    /// Fields overriding the enriched context
    #[serde(default)]
    pub extra: Option<ErrorContext>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub method: ResolutionMethod,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveData {
    pub id: String,
    pub resolved: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub window_ms: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopErrorsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ClearData {
    pub cleared: usize,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub chain_id: u64,
    pub rpc_enabled: bool,
    pub telemetry_events: usize,
}

//! Security audit backend client
//!
//! Talks to the compiler API's `/api/security-audit` routes. An audit that
//! cannot be obtained degrades to a failed result (score 0, grade F) rather
//! than an error.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::models::config::SentinelConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::FindingSeverity;
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

const AUDIT_PATH: &str = "/api/security-audit/audit";
const HEALTH_PATH: &str = "/api/security-audit/health";
const STANDARDS_PATH: &str = "/api/security-audit/standards";

/// Letter grade assigned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditGrade {
    A,
    B,
    C,
    D,
    F,
}

/// One issue reported by the backend tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditIssue {
    pub id: String,
    pub severity: FindingSeverity,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    #[serde(default)]
    pub file: Option<String>,
    pub tool: String,
    pub recommendation: String,
    #[serde(default)]
    pub impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub score: u8,
    pub grade: AuditGrade,
    pub issues: Vec<AuditIssue>,
    pub summary: AuditSummary,
    pub recommendations: Vec<String>,
    pub passed: bool,
    /// Backend processing time (ms)
    pub audit_time: u64,
    pub tools_used: Vec<String>,
}

impl AuditResult {
    /// Placeholder returned when the audit could not run
    pub fn failed() -> Self {
        Self {
            score: 0,
            grade: AuditGrade::F,
            issues: Vec::new(),
            summary: AuditSummary::default(),
            recommendations: vec!["Audit failed. Please try again.".to_string()],
            passed: false,
            audit_time: 0,
            tools_used: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditRequest<'a> {
    source_code: &'a str,
    contract_name: &'a str,
}

/// HTTP client for the audit backend
#[derive(Clone)]
pub struct AuditClient {
    base_url: String,
    client: reqwest::Client,
}

impl AuditClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::with_source(ErrorCode::AuditRequestFailed, "Failed to build HTTP client", e))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &SentinelConfig) -> AppResult<Self> {
        Self::new(config.audit_url.clone(), config.audit_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Audit a contract; failures are logged and turned into `AuditResult::failed()`
    pub async fn audit(&self, source_code: &str, contract_name: &str) -> AuditResult {
        info!("🔍 Requesting backend audit for {}", contract_name);
        match self.try_audit(source_code, contract_name).await {
            Ok(result) => {
                info!(
                    "✅ Audit complete for {}: score {} grade {:?}",
                    contract_name, result.score, result.grade
                );
                result
            }
            Err(e) => {
                error!("❌ Security audit failed for {}: {}", contract_name, e);
                AuditResult::failed()
            }
        }
    }

    /// Audit without the degraded fallback
    pub async fn try_audit(&self, source_code: &str, contract_name: &str) -> AppResult<AuditResult> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, AUDIT_PATH))
            .json(&AuditRequest {
                source_code,
                contract_name,
            })
            .send()
            .await
            .map_err(|e| AppError::with_source(ErrorCode::AuditRequestFailed, "Audit request failed", e))?;

        let status = response.status();
        let envelope: Envelope<AuditResult> = response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorCode::AuditRequestFailed,
                format!("Unreadable audit response (HTTP {})", status),
                e,
            )
        })?;

        if !status.is_success() || !envelope.success {
            let reason = envelope
                .error
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(AppError::audit_rejected(reason));
        }

        envelope
            .data
            .ok_or_else(|| AppError::audit_rejected("Audit response without data"))
    }

    /// `true` when the backend reports itself healthy
    pub async fn health(&self) -> bool {
        let result = async {
            let response = self
                .client
                .get(format!("{}{}", self.base_url, HEALTH_PATH))
                .send()
                .await?;
            response.json::<HealthResponse>().await
        }
        .await;

        match result {
            Ok(health) => health.success && health.status == "healthy",
            Err(e) => {
                warn!("⚠️ Audit health check failed: {}", e);
                false
            }
        }
    }

    /// Security standards published by the backend, `None` on failure
    pub async fn standards(&self) -> Option<serde_json::Value> {
        let result = async {
            let response = self
                .client
                .get(format!("{}{}", self.base_url, STANDARDS_PATH))
                .send()
                .await?;
            response.json::<Envelope<serde_json::Value>>().await
        }
        .await;

        match result {
            Ok(envelope) => envelope.data,
            Err(e) => {
                warn!("⚠️ Failed to get standards: {}", e);
                None
            }
        }
    }
}

//! Integration tests for Contract Sentinel

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use contract_sentinel::{
    api::{create_router, AppState},
    ClassifiedError, ErrorCategory, ErrorClassifier, ErrorContext, ErrorContextEnricher,
    ErrorSeverity, ErrorTelemetry, FindingSeverity, PatternScanner, ResolutionMethod, RiskLevel,
    RiskScore, SentinelConfig, TrackOptions,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const CLEAN: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity 0.8.20;

contract Vault {
    uint256 public total;

    function deposit(uint256 amount) external {
        require(amount > 0, "zero");
        total += amount;
    }
}
"#;

// ============================================
// Classification
// ============================================

#[test]
fn test_rule_category_ignores_context() {
    let cases = [
        ("insufficient ether", ErrorCategory::Wallet, ErrorSeverity::High),
        ("User denied transaction signature", ErrorCategory::Wallet, ErrorSeverity::Medium),
        ("Unknown signature 0x1234", ErrorCategory::Deployment, ErrorSeverity::High),
        ("TypeError: fetch failed", ErrorCategory::Network, ErrorSeverity::Medium),
        ("Solidity error: undeclared identifier", ErrorCategory::Compilation, ErrorSeverity::High),
        ("gas required exceeds allowance (30000000)", ErrorCategory::Deployment, ErrorSeverity::High),
        ("missing required field: name", ErrorCategory::Validation, ErrorSeverity::Medium),
    ];

    let rich = ErrorContext {
        template: Some("ERC721".to_string()),
        network: Some("Base".to_string()),
        chain_id: Some(8453),
        gas_price: Some("0.01 gwei".to_string()),
        ..Default::default()
    };

    for (message, category, severity) in cases {
        for context in [ErrorContext::default(), rich.clone()] {
            let err = ErrorClassifier::classify(message, context);
            assert_eq!(err.category, category, "{}", message);
            assert_eq!(err.severity, severity, "{}", message);
        }
    }
}

#[test]
fn test_unknown_error_is_generic() {
    for message in ["", "segfault in renderer", "0xdeadbeef"] {
        let err = ErrorClassifier::classify(message, ErrorContext::default());
        assert_eq!(err.category, ErrorCategory::System);
        assert_eq!(err.severity, ErrorSeverity::Medium);
        assert!(err.can_retry);
    }
}

#[test]
fn test_classification_is_deterministic() {
    let context = ErrorContext {
        network: Some("Ethereum".to_string()),
        ..Default::default()
    };
    let a = ErrorClassifier::classify("execution reverted", context.clone());
    let b = ErrorClassifier::classify("execution reverted", context);
    assert_eq!(a.category, b.category);
    assert_eq!(a.severity, b.severity);
    assert_eq!(a.message_key, b.message_key);
    assert_eq!(a.message_params, b.message_params);
    assert_ne!(a.id, b.id);
}

#[test]
fn test_insufficient_funds_example() {
    let context = ErrorContext {
        estimated_cost: Some("5 ETH".to_string()),
        user_balance: Some("0.1 ETH".to_string()),
        network: Some("Ethereum".to_string()),
        ..Default::default()
    };
    let err = ErrorClassifier::classify("insufficient funds for intrinsic transaction cost", context);
    assert_eq!(err.category, ErrorCategory::Wallet);
    assert_eq!(err.severity, ErrorSeverity::High);
    assert_eq!(err.message_params["estimatedCost"], "5 ETH");
    assert_eq!(err.message_params["userBalance"], "0.1 ETH");
    assert_eq!(err.message_params["network"], "Ethereum");
}

#[test]
fn test_user_rejected_not_retryable() {
    let err = ErrorClassifier::classify("user rejected", ErrorContext::default());
    assert_eq!(err.category, ErrorCategory::Wallet);
    assert_eq!(err.severity, ErrorSeverity::Medium);
    assert!(!err.can_retry);
}

#[test]
fn test_sanitize_example() {
    let context = ErrorContext {
        user_address: Some("0x1234567890abcdef1234567890abcdef12345678".to_string()),
        chain_id: Some(1),
        ..Default::default()
    };
    let clean = ErrorContextEnricher::sanitize(&context);
    assert_eq!(clean.user_address.as_deref(), Some("0x1234...5678"));
    assert_eq!(clean.chain_id, Some(1));
}

// ============================================
// Telemetry
// ============================================

#[test]
fn test_track_then_resolve_retry() {
    let telemetry = ErrorTelemetry::new(10);
    let err = ErrorClassifier::classify("timeout", ErrorContext::default());
    telemetry.track(&err, TrackOptions::default());
    telemetry.track_resolution(&err.id, ResolutionMethod::Retry);

    let event = telemetry
        .events()
        .into_iter()
        .find(|e| e.error.id == err.id)
        .unwrap();
    assert!(event.resolved);
    assert_eq!(event.resolution_method, Some(ResolutionMethod::Retry));
}

#[test]
fn test_capacity_never_exceeded() {
    let capacity = 4;
    let telemetry = ErrorTelemetry::new(capacity);
    let mut tracked: Vec<ClassifiedError> = Vec::new();

    for i in 0..25 {
        let message = if i % 2 == 0 { "out of gas" } else { "user denied" };
        let err = ErrorClassifier::classify(message, ErrorContext::default());
        telemetry.track(&err, TrackOptions::default());
        tracked.push(err);
        assert!(telemetry.len() <= capacity);
    }

    let kept: Vec<String> = telemetry.events().into_iter().map(|e| e.error.id).collect();
    let newest: Vec<String> = tracked[tracked.len() - capacity..]
        .iter()
        .map(|e| e.id.clone())
        .collect();
    assert_eq!(kept, newest);
}

// ============================================
// Scanning
// ============================================

#[test]
fn test_clean_and_empty_sources_score_100() {
    for source in ["", CLEAN] {
        let findings = PatternScanner::scan(source);
        assert!(findings.is_empty(), "{:?}", findings);
        let score = RiskScore::from_findings(&findings);
        assert_eq!(score.total, 100);
        assert_eq!(score.level, RiskLevel::Low);
    }
}

#[test]
fn test_malicious_source_findings() {
    let source = r#"// SPDX-License-Identifier: MIT
pragma solidity 0.8.20;

contract Trap {
    function close() external {
        require(tx.origin == msg.sender, "no contracts");
        selfdestruct(payable(msg.sender));
    }
}
"#;
    let findings = PatternScanner::scan(source);
    assert!(findings.len() >= 2);
    assert!(findings.iter().any(|f| f.severity == FindingSeverity::Critical));
    assert!(findings.iter().any(|f| {
        f.title.contains("tx.origin")
            && matches!(f.severity, FindingSeverity::Medium | FindingSeverity::High)
    }));
    assert!(RiskScore::from_findings(&findings).total < 100);
}

// ============================================
// HTTP API
// ============================================

fn test_router() -> axum::Router {
    let state = Arc::new(AppState::new(
        SentinelConfig::default(),
        Arc::new(ErrorTelemetry::new(50)),
        None,
    ));
    create_router(state)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_api_health() {
    let app = test_router();
    let (status, body) = send(&app, get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["rpc_enabled"], false);
}

#[tokio::test]
async fn test_api_scan() {
    let app = test_router();
    let (status, body) = send(
        &app,
        post_json(
            "/v1/scan",
            json!({ "sourceCode": CLEAN, "contractName": "Vault", "includeReport": true }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["analysis"]["overallScore"], 100);
    assert_eq!(body["data"]["score"]["total"], 100);
    assert!(body["data"]["report"].as_str().unwrap().contains("Vault"));

    let (status, body) = send(&app, post_json("/v1/scan", json!({ "sourceCode": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
}

#[tokio::test]
async fn test_api_quick_scan() {
    let app = test_router();
    let (status, body) = send(
        &app,
        post_json("/v1/scan/quick", json!({ "sourceCode": "function f() { selfdestruct(owner); }" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["critical"], true);
}

#[tokio::test]
async fn test_api_error_lifecycle() {
    let app = test_router();

    let (status, body) = send(
        &app,
        post_json(
            "/v1/errors/classify",
            json!({
                "message": "insufficient funds for gas",
                "context": { "chainId": 137, "userAddress": "0x1234567890abcdef1234567890abcdef12345678" }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let error = &body["data"];
    assert_eq!(error["category"], "wallet");
    assert_eq!(error["severity"], "high");
    assert_eq!(error["messageParams"]["network"], "Polygon");
    let id = error["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post_json(&format!("/v1/errors/{}/resolve", id), json!({ "method": "manual" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resolved"], true);

    let (_, body) = send(&app, get("/v1/errors/stats")).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["byCategory"]["wallet"], 1);
    assert_eq!(body["data"]["resolutionRate"], 100.0);

    let (_, body) = send(&app, get("/v1/errors/top?limit=3")).await;
    assert_eq!(body["data"][0]["titleKey"], "smartErrors.wallet.insufficientFunds.title");

    let (status, body) = send(&app, get("/v1/errors/export")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "1.0");
    assert_eq!(
        body["events"][0]["error"]["context"]["userAddress"],
        "0x1234...5678"
    );

    let request = Request::builder()
        .method("DELETE")
        .uri("/v1/errors")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, request).await;
    assert_eq!(body["data"]["cleared"], 1);

    let (_, body) = send(&app, get("/v1/errors/stats")).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_api_resolve_unknown_id() {
    let app = test_router();
    let (status, body) = send(
        &app,
        post_json("/v1/errors/err_0_missing/resolve", json!({ "method": "retry" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resolved"], false);
}

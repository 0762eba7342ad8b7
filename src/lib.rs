//! Contract Sentinel Library
//!
//! Security tooling around smart contract deployment:
//! - Solidity source scanning with a 0-100 risk score
//! - Classification of deployment errors into localized, actionable advice
//! - Chain-aware error context (network, gas price, balance)
//! - Bounded error telemetry with statistics and export

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::classifier::{ErrorClassifier, ErrorRule};
pub use crate::core::enricher::{ChainDataSource, ContextRequest, ErrorContextEnricher};
pub use crate::core::handler::{ActionHandler, SmartErrorHandler};
pub use crate::core::risk_score::{RiskScore, ScoreFactor};
pub use crate::core::scanner::PatternScanner;
pub use models::config::SentinelConfig;
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::smart_error::{
    ClassifiedError, ErrorCategory, ErrorContext, ErrorSeverity, ResolutionMethod, Solution,
    SolutionAction, SolutionKind,
};
pub use models::types::{Finding, FindingCategory, FindingSeverity, QuickCheck, RiskLevel, SecurityAnalysis};
pub use utils::report::format_report;
pub use utils::telemetry::{AnalyticsSink, ErrorStats, ErrorTelemetry, TrackOptions, TracingSink};

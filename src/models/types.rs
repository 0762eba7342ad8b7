//! Type definitions for source scanning
//! All data structures produced by the pattern scanner and risk scoring

use serde::{Deserialize, Serialize};

/// Severity of a single finding
///
/// Ordered from least to most severe so `as u8` comparisons work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingSeverity {
    /// Advisory (audit label INFO)
    Low,
    /// Audit label WARNING
    Medium,
    /// Audit label ERROR
    High,
    /// Audit label CRITICAL
    Critical,
}

impl FindingSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingSeverity::Low => "LOW",
            FindingSeverity::Medium => "MEDIUM",
            FindingSeverity::High => "HIGH",
            FindingSeverity::Critical => "CRITICAL",
        }
    }

    /// Label used by audit reports (INFO/WARNING/ERROR/CRITICAL)
    pub fn audit_label(&self) -> &'static str {
        match self {
            FindingSeverity::Low => "INFO",
            FindingSeverity::Medium => "WARNING",
            FindingSeverity::High => "ERROR",
            FindingSeverity::Critical => "CRITICAL",
        }
    }

    /// Points subtracted from the 100 starting score
    pub fn penalty(&self) -> u8 {
        match self {
            FindingSeverity::Low => 2,
            FindingSeverity::Medium => 8,
            FindingSeverity::High => 15,
            FindingSeverity::Critical => 25,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            FindingSeverity::Low => "🔵",
            FindingSeverity::Medium => "🟠",
            FindingSeverity::High => "🔴",
            FindingSeverity::Critical => "💀",
        }
    }
}

/// What kind of weakness a finding points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCategory {
    Reentrancy,
    UncheckedExternalCalls,
    IntegerOverflow,
    AccessControl,
    TimestampDependence,
    FloatingPragma,
    SuspiciousKeyword,
    UnusualPermissions,
    MaliciousFunctions,
    MissingLicense,
    CustomStandardImplementation,
}

impl FindingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCategory::Reentrancy => "REENTRANCY",
            FindingCategory::UncheckedExternalCalls => "UNCHECKED_EXTERNAL_CALLS",
            FindingCategory::IntegerOverflow => "INTEGER_OVERFLOW",
            FindingCategory::AccessControl => "ACCESS_CONTROL",
            FindingCategory::TimestampDependence => "TIMESTAMP_DEPENDENCE",
            FindingCategory::FloatingPragma => "FLOATING_PRAGMA",
            FindingCategory::SuspiciousKeyword => "SUSPICIOUS_KEYWORD",
            FindingCategory::UnusualPermissions => "UNUSUAL_PERMISSIONS",
            FindingCategory::MaliciousFunctions => "MALICIOUS_FUNCTIONS",
            FindingCategory::MissingLicense => "MISSING_LICENSE",
            FindingCategory::CustomStandardImplementation => "CUSTOM_STANDARD_IMPLEMENTATION",
        }
    }
}

/// One flagged pattern in a scanned source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub category: FindingCategory,
    pub severity: FindingSeverity,
    pub title: String,
    pub description: String,
    /// 1-based line number, when the check is line oriented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Finding {
    pub fn new(
        category: FindingCategory,
        severity: FindingSeverity,
        title: impl Into<String>,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            title: title.into(),
            description: description.into(),
            line: None,
            recommendation: recommendation.into(),
            snippet: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Risk band derived from the 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// LOW >= 80, MEDIUM >= 60, HIGH >= 30, else CRITICAL
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => RiskLevel::Low,
            60..=79 => RiskLevel::Medium,
            30..=59 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "✅",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🔴",
            RiskLevel::Critical => "💀",
        }
    }
}

/// Heuristic observations about the contract as a whole
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInsights {
    /// Confidence in the scan result (70-95)
    pub confidence: u8,
    pub summary: String,
    /// Notable low-level constructs present in the source
    pub detected_patterns: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Full result of `core::scanner::analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAnalysis {
    pub contract_name: String,
    /// 0-100, higher is safer
    pub overall_score: u8,
    pub risk_level: RiskLevel,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    pub insights: ContractInsights,
}

impl SecurityAnalysis {
    /// Count findings at a given severity
    pub fn count(&self, severity: FindingSeverity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has_critical(&self) -> bool {
        self.count(FindingSeverity::Critical) > 0
    }
}

/// Result of the fast pre-publication check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickCheck {
    pub score: u8,
    pub critical: bool,
}

//! Risk Scoring Module
//! Turns scanner findings into a 0-100 score and a risk band
//!
//! Every contract starts at 100; each finding subtracts a fixed penalty
//! by severity (CRITICAL 25, ERROR 15, WARNING 8, INFO 2), floored at 0.

use serde::{Deserialize, Serialize};

use crate::models::types::{Finding, FindingCategory, FindingSeverity, RiskLevel};

/// Score of a scanned contract (100 = nothing found)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Overall score (0-100)
    pub total: u8,
    /// Band derived from the score
    pub level: RiskLevel,
    /// Per-severity breakdown for transparency
    pub breakdown: Vec<ScoreFactor>,
}

/// Penalty contributed by all findings of one severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub severity: FindingSeverity,
    pub count: usize,
    pub penalty: u32,
}

impl RiskScore {
    /// Compute the score for a list of findings
    pub fn from_findings(findings: &[Finding]) -> Self {
        let breakdown: Vec<ScoreFactor> = [
            FindingSeverity::Critical,
            FindingSeverity::High,
            FindingSeverity::Medium,
            FindingSeverity::Low,
        ]
        .into_iter()
        .filter_map(|severity| {
            let count = findings.iter().filter(|f| f.severity == severity).count();
            (count > 0).then(|| ScoreFactor {
                severity,
                count,
                penalty: count as u32 * severity.penalty() as u32,
            })
        })
        .collect();

        let total_penalty: u32 = breakdown.iter().map(|f| f.penalty).sum();
        let total = 100u32.saturating_sub(total_penalty) as u8;

        Self {
            total,
            level: RiskLevel::from_score(total),
            breakdown,
        }
    }

    /// Get color code for UI
    pub fn color_code(&self) -> &'static str {
        match self.level {
            RiskLevel::Low => "#22c55e",
            RiskLevel::Medium => "#eab308",
            RiskLevel::High => "#ef4444",
            RiskLevel::Critical => "#7c2d12",
        }
    }
}

/// Build the recommendation list shown under a scan report
///
/// Order is stable: severity banners, category advice, then generic advice.
pub fn generate_recommendations(findings: &[Finding]) -> Vec<String> {
    let mut recommendations: Vec<String> = Vec::new();
    let mut add = |text: &str| {
        if !recommendations.iter().any(|r| r == text) {
            recommendations.push(text.to_string());
        }
    };

    let has_severity = |severity: FindingSeverity| findings.iter().any(|f| f.severity == severity);
    let has_category = |category: FindingCategory| findings.iter().any(|f| f.category == category);

    if has_severity(FindingSeverity::Critical) {
        add("⚠️ CRITICAL: this contract has critical vulnerabilities that must be fixed before deployment");
    }
    if has_severity(FindingSeverity::High) {
        add("🛡️ Run a full security audit before deployment");
    }
    if has_category(FindingCategory::Reentrancy) {
        add("Apply the Checks-Effects-Interactions pattern or use ReentrancyGuard");
    }
    if has_category(FindingCategory::AccessControl) {
        add("Review and strengthen access control");
    }
    if has_category(FindingCategory::IntegerOverflow) {
        add("Use SafeMath or Solidity 0.8+ to prevent overflows");
    }

    add("Test the contract on a testnet before mainnet");
    add("Consider an external audit for high-value contracts");
    add("Document every public function clearly");

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: FindingSeverity, category: FindingCategory) -> Finding {
        Finding::new(category, severity, "t", "d", "r")
    }

    #[test]
    fn test_no_findings_scores_100() {
        let score = RiskScore::from_findings(&[]);
        assert_eq!(score.total, 100);
        assert_eq!(score.level, RiskLevel::Low);
        assert!(score.breakdown.is_empty());
    }

    #[test]
    fn test_penalties() {
        let findings = vec![
            finding(FindingSeverity::Critical, FindingCategory::MaliciousFunctions),
            finding(FindingSeverity::High, FindingCategory::AccessControl),
            finding(FindingSeverity::Medium, FindingCategory::FloatingPragma),
            finding(FindingSeverity::Low, FindingCategory::MissingLicense),
        ];
        let score = RiskScore::from_findings(&findings);
        assert_eq!(score.total, 100 - 25 - 15 - 8 - 2);
        assert_eq!(score.level, RiskLevel::High);
        assert_eq!(score.breakdown.len(), 4);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let findings: Vec<_> = (0..10)
            .map(|_| finding(FindingSeverity::Critical, FindingCategory::MaliciousFunctions))
            .collect();
        let score = RiskScore::from_findings(&findings);
        assert_eq!(score.total, 0);
        assert_eq!(score.level, RiskLevel::Critical);
    }

    #[test]
    fn test_risk_bands() {
        assert_eq!(RiskLevel::from_score(80), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(79), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(29), RiskLevel::Critical);
    }

    #[test]
    fn test_recommendations() {
        let findings = vec![finding(FindingSeverity::Critical, FindingCategory::Reentrancy)];
        let recs = generate_recommendations(&findings);
        assert!(recs[0].contains("CRITICAL"));
        assert!(recs.iter().any(|r| r.contains("ReentrancyGuard")));
        assert_eq!(generate_recommendations(&[]).len(), 3);
    }
}

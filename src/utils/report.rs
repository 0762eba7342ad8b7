//! Markdown rendering of a security analysis

use std::fmt::Write;

use crate::models::types::{FindingSeverity, SecurityAnalysis};

/// Render an analysis as a Markdown report
pub fn format_report(analysis: &SecurityAnalysis) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# 🛡️ Security Report: {}", analysis.contract_name);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "**Score:** {}/100 | **Risk:** {} {}",
        analysis.overall_score,
        analysis.risk_level.emoji(),
        analysis.risk_level.as_str()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "| Severity | Count |");
    let _ = writeln!(out, "|----------|-------|");
    for severity in [
        FindingSeverity::Critical,
        FindingSeverity::High,
        FindingSeverity::Medium,
        FindingSeverity::Low,
    ] {
        let _ = writeln!(
            out,
            "| {} {} | {} |",
            severity.emoji(),
            severity.as_str(),
            analysis.count(severity)
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Findings");
    let _ = writeln!(out);
    if analysis.findings.is_empty() {
        let _ = writeln!(out, "No issues detected.");
    }
    for finding in &analysis.findings {
        let location = finding
            .line
            .map(|l| format!(" (line {})", l))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "### {} [{}] {}{}",
            finding.severity.emoji(),
            finding.severity.as_str(),
            finding.title,
            location
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", finding.description);
        if let Some(snippet) = &finding.snippet {
            let _ = writeln!(out);
            let _ = writeln!(out, "```solidity\n{}\n```", snippet);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "> 💡 {}", finding.recommendation);
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Recommendations");
    let _ = writeln!(out);
    for rec in &analysis.recommendations {
        let _ = writeln!(out, "- {}", rec);
    }
    let _ = writeln!(out);

    let insights = &analysis.insights;
    let _ = writeln!(out, "## Insights (confidence {}%)", insights.confidence);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", insights.summary);
    for pattern in &insights.detected_patterns {
        let _ = writeln!(out, "- ✅ {}", pattern);
    }
    for factor in &insights.risk_factors {
        let _ = writeln!(out, "- ⚠️ {}", factor);
    }

    out
}

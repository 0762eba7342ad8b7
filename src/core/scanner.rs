//! Pattern Scanner Module
//! Flags risky constructs in Solidity source with plain regex/keyword scans
//!
//! Checks run in a fixed order:
//! 1. Line checks (unchecked calls, reentrancy, tx.origin, timestamp)
//! 2. Known dangerous built-ins over the whole document
//! 3. Access control heuristics
//! 4. Arithmetic / pragma checks
//! 5. Keyword denylist (advisory)
//! 6. File structure (license, OpenZeppelin usage)
//!
//! Everything here is a pure function of the input string.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::core::risk_score::{generate_recommendations, RiskScore};
use crate::models::types::{
    ContractInsights, Finding, FindingCategory, FindingSeverity, QuickCheck, SecurityAnalysis,
};

/// Longest snippet kept on a finding
const MAX_SNIPPET_CHARS: usize = 120;

/// Suspicious words, matched case-insensitively at a word start
const SUSPICIOUS_KEYWORDS: [&str; 14] = [
    "backdoor", "exploit", "hack", "steal", "drain", "rug", "honeypot", "scam", "ponzi", "pump",
    "dump", "exit", "hidden", "secret",
];

/// Functions that move or create value and need an access modifier
const SENSITIVE_FUNCTIONS: [&str; 4] = ["mint", "burn", "withdraw", "emergencyWithdraw"];

lazy_static! {
    /// Dangerous or deprecated built-ins, one CRITICAL finding per match
    static ref MALICIOUS_PATTERNS: Vec<Regex> = [
        r"(?i)selfdestruct\s*\(",
        r"(?i)delegatecall\s*\(",
        r"(?i)assembly\s*\{",
        r"(?i)suicide\s*\(",
        r"(?i)tx\.origin",
        r"(?i)block\.coinbase",
        r"(?i)block\.gaslimit",
        r"(?i)msg\.gas\b",
        r"(?i)sha3\s*\(",
        r"(?i)throw\s*;",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();

    static ref KEYWORD_PATTERNS: Vec<(&'static str, Regex)> = SUSPICIOUS_KEYWORDS
        .iter()
        .filter_map(|kw| Regex::new(&format!(r"(?i)\b{}", kw)).ok().map(|re| (*kw, re)))
        .collect();

    static ref NOW_WORD: Regex = Regex::new(r"\bnow\b").expect("static regex");
    static ref PRAGMA: Regex = Regex::new(r"pragma\s+solidity\s+([^;]+);").expect("static regex");
    static ref PRAGMA_MINOR: Regex = Regex::new(r"0\.(\d+)").expect("static regex");
    static ref COMPOUND_ASSIGN: Regex = Regex::new(r"[+\-*/]\s*=").expect("static regex");
    static ref ONLY_MODIFIER: Regex = Regex::new(r"\bonly[A-Za-z0-9_]*").expect("static regex");
    static ref VISIBILITY: Regex = Regex::new(r"\b(public|external)\b").expect("static regex");
    static ref SENSITIVE_FN: Regex = Regex::new(&format!(
        r"function\s+({})\s*\([^)]*\)([^{{;]*)([{{;])",
        SENSITIVE_FUNCTIONS.join("|")
    ))
    .expect("static regex");
}

/// Solidity source scanner
///
/// Stateless: all patterns are compiled once and shared.
pub struct PatternScanner;

impl PatternScanner {
    /// Scan source code and return findings in check order
    pub fn scan(source: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        findings.extend(Self::line_checks(source));
        findings.extend(Self::malicious_patterns(source));
        findings.extend(Self::access_control(source));
        findings.extend(Self::common_vulnerabilities(source));
        findings.extend(Self::suspicious_keywords(source));
        findings.extend(Self::contract_structure(source));

        debug!("🔍 Scan produced {} findings", findings.len());
        findings
    }

    /// Full analysis: findings, score, risk level, recommendations, insights
    pub fn analyze(source: &str, contract_name: &str) -> SecurityAnalysis {
        let findings = Self::scan(source);
        let score = RiskScore::from_findings(&findings);
        let recommendations = generate_recommendations(&findings);
        let insights = Self::insights(source, contract_name);

        SecurityAnalysis {
            contract_name: contract_name.to_string(),
            overall_score: score.total,
            risk_level: score.level,
            findings,
            recommendations,
            insights,
        }
    }

    /// Fast check used before publishing a contract to the marketplace
    pub fn quick_check(source: &str) -> QuickCheck {
        let mut score: u8 = 100;
        let mut critical = false;

        if MALICIOUS_PATTERNS.iter().any(|re| re.is_match(source)) {
            score = score.saturating_sub(50);
            critical = true;
        }

        let has_external_call = source.contains("call.value(") || source.contains(".call(");
        if has_external_call && !source.contains("nonReentrant") {
            score = score.saturating_sub(30);
            critical = true;
        }

        if source.contains("tx.origin") {
            score = score.saturating_sub(20);
        }

        QuickCheck { score, critical }
    }

    // ============================================
    // Individual checks
    // ============================================

    fn line_checks(source: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = line.trim();

            if is_comment(trimmed) {
                continue;
            }

            let external_call = trimmed.contains(".call(") || trimmed.contains(".call{");

            if external_call && !trimmed.contains("require(") {
                findings.push(
                    Finding::new(
                        FindingCategory::UncheckedExternalCalls,
                        FindingSeverity::High,
                        "Unchecked external call",
                        "Return value of a low-level call is not checked",
                        "Always check the result of external calls with require() or an explicit condition",
                    )
                    .at_line(line_number)
                    .with_snippet(truncate(trimmed)),
                );
            }

            if trimmed.contains("call.value(") || (external_call && trimmed.contains("msg.value")) {
                findings.push(
                    Finding::new(
                        FindingCategory::Reentrancy,
                        FindingSeverity::Critical,
                        "Potential reentrancy",
                        "Value-carrying external call can re-enter the contract",
                        "Use the checks-effects-interactions pattern or OpenZeppelin's ReentrancyGuard",
                    )
                    .at_line(line_number)
                    .with_snippet(truncate(trimmed)),
                );
            }

            if trimmed.contains("tx.origin") {
                findings.push(
                    Finding::new(
                        FindingCategory::AccessControl,
                        FindingSeverity::High,
                        "tx.origin used",
                        "tx.origin is used, phishing contracts can impersonate the caller",
                        "Use msg.sender instead of tx.origin for authentication",
                    )
                    .at_line(line_number)
                    .with_snippet(truncate(trimmed)),
                );
            }

            if trimmed.contains("block.timestamp") || NOW_WORD.is_match(trimmed) {
                findings.push(
                    Finding::new(
                        FindingCategory::TimestampDependence,
                        FindingSeverity::Medium,
                        "Timestamp dependence",
                        "Logic depends on the block timestamp, which miners can skew",
                        "Avoid relying on block.timestamp for critical logic",
                    )
                    .at_line(line_number)
                    .with_snippet(truncate(trimmed)),
                );
            }
        }

        findings
    }

    fn malicious_patterns(source: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for pattern in MALICIOUS_PATTERNS.iter() {
            for m in pattern.find_iter(source) {
                findings.push(
                    Finding::new(
                        FindingCategory::MaliciousFunctions,
                        FindingSeverity::Critical,
                        "Dangerous pattern",
                        format!("Potentially malicious pattern detected: {}", m.as_str()),
                        "This construct is dangerous and must be justified",
                    )
                    .at_line(line_of(source, m.start()))
                    .with_snippet(truncate(m.as_str())),
                );
            }
        }

        findings
    }

    fn access_control(source: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        let has_access_modifier = source.contains("onlyOwner") || source.contains("onlyAdmin");
        let has_ownership = source.contains("owner");

        if has_ownership && !has_access_modifier {
            findings.push(Finding::new(
                FindingCategory::AccessControl,
                FindingSeverity::Medium,
                "Ownership without access modifiers",
                "The contract tracks an owner but has no clear access modifiers",
                "Add modifiers such as onlyOwner to protect sensitive functions",
            ));
        }

        for caps in SENSITIVE_FN.captures_iter(source) {
            let (Some(whole), Some(name), Some(modifiers), Some(terminator)) =
                (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };

            // Declarations without a body (interfaces, abstract contracts)
            if terminator.as_str() == ";" {
                continue;
            }

            let exposed = VISIBILITY.is_match(modifiers.as_str());
            let guarded = ONLY_MODIFIER.is_match(modifiers.as_str());

            if exposed && !guarded {
                findings.push(
                    Finding::new(
                        FindingCategory::UnusualPermissions,
                        FindingSeverity::High,
                        "Unprotected sensitive function",
                        format!(
                            "Sensitive function {} is public without access protection",
                            name.as_str()
                        ),
                        format!(
                            "Protect {} with an appropriate access modifier",
                            name.as_str()
                        ),
                    )
                    .at_line(line_of(source, whole.start())),
                );
            }
        }

        findings
    }

    fn common_vulnerabilities(source: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        let pragma = PRAGMA.captures(source).and_then(|c| c.get(1)).map(|m| m.as_str().trim());

        let checked_arithmetic = pragma
            .and_then(|v| PRAGMA_MINOR.captures(v))
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(|minor| minor >= 8)
            .unwrap_or(false);

        if !source.contains("SafeMath") && !checked_arithmetic && COMPOUND_ASSIGN.is_match(source) {
            findings.push(Finding::new(
                FindingCategory::IntegerOverflow,
                FindingSeverity::High,
                "Unchecked arithmetic",
                "Arithmetic without overflow/underflow protection",
                "Use SafeMath or Solidity 0.8+ for built-in overflow checks",
            ));
        }

        if let Some(version) = pragma {
            if version.contains('^') || version.contains('~') {
                findings.push(Finding::new(
                    FindingCategory::FloatingPragma,
                    FindingSeverity::Medium,
                    "Floating pragma",
                    format!("Floating Solidity version: {}", version),
                    "Pin the compiler version to avoid unexpected changes",
                ));
            }
        }

        findings
    }

    fn suspicious_keywords(source: &str) -> Vec<Finding> {
        KEYWORD_PATTERNS
            .iter()
            .filter_map(|(keyword, re)| {
                re.find(source).map(|m| {
                    Finding::new(
                        FindingCategory::SuspiciousKeyword,
                        FindingSeverity::Low,
                        "Suspicious keyword",
                        format!("Suspicious keyword detected: \"{}\"", keyword),
                        "Check the context in which this keyword is used",
                    )
                    .at_line(line_of(source, m.start()))
                })
            })
            .collect()
    }

    fn contract_structure(source: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        if source.trim().is_empty() {
            return findings;
        }

        if !source.contains("SPDX-License-Identifier") {
            findings.push(Finding::new(
                FindingCategory::MissingLicense,
                FindingSeverity::Low,
                "Missing SPDX license",
                "No SPDX license identifier found",
                "Add an SPDX license identifier at the top of the file",
            ));
        }

        let uses_openzeppelin = source.contains("@openzeppelin/contracts");
        if !uses_openzeppelin && (source.contains("ERC20") || source.contains("ERC721")) {
            findings.push(Finding::new(
                FindingCategory::CustomStandardImplementation,
                FindingSeverity::Medium,
                "Custom token standard",
                "Token standard implemented without OpenZeppelin",
                "Prefer OpenZeppelin contracts over custom ERC implementations",
            ));
        }

        findings
    }

    fn insights(source: &str, contract_name: &str) -> ContractInsights {
        let mut detected_patterns = Vec::new();
        let mut risk_factors = Vec::new();

        if source.contains("delegatecall") {
            detected_patterns.push("delegatecall usage".to_string());
        }
        if source.contains("assembly") {
            detected_patterns.push("Inline assembly".to_string());
        }
        if source.contains("selfdestruct") {
            detected_patterns.push("Self-destruct capability".to_string());
        }

        if source.len() < 500 {
            risk_factors.push("Very short contract, possibly incomplete".to_string());
        }
        if source.lines().count() < 20 {
            risk_factors.push("Few lines of code".to_string());
        }
        if !source.contains("require(") {
            risk_factors.push("No require() validation".to_string());
        }

        let penalty = (risk_factors.len() as u8).saturating_mul(5);
        let confidence = 95u8.saturating_sub(penalty).max(70);

        ContractInsights {
            confidence,
            summary: format!(
                "Heuristic review of {}: {}% confidence",
                contract_name, confidence
            ),
            detected_patterns,
            risk_factors,
        }
    }
}

// Helper functions

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// 1-based line of a byte offset
fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_SNIPPET_CHARS).collect()
}

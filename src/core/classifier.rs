//! Error Classifier Module
//! Maps raw error text plus context to a `ClassifiedError`
//!
//! Rules form a closed, ordered set. The first rule whose pattern matches
//! the raw message wins and the rest are not evaluated. When nothing
//! matches, a generic system/medium classification is returned, so
//! classification never fails.

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::debug;

use crate::models::smart_error::{
    ClassifiedError, ErrorCategory, ErrorContext, ErrorSeverity, Solution, SolutionAction,
    SolutionKind,
};
use crate::utils::constants::{now_millis, HELP_URL_BASE};

/// Length of the random id suffix
const ID_SUFFIX_LEN: usize = 9;

/// Known error shapes, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorRule {
    InsufficientFunds,
    TransactionRejected,
    SimulationFailed,
    ConnectionFailed,
    CompilationFailed,
    GasLimit,
    InvalidInput,
}

/// Evaluation order. First match wins.
pub const RULES: [ErrorRule; 7] = [
    ErrorRule::InsufficientFunds,
    ErrorRule::TransactionRejected,
    ErrorRule::SimulationFailed,
    ErrorRule::ConnectionFailed,
    ErrorRule::CompilationFailed,
    ErrorRule::GasLimit,
    ErrorRule::InvalidInput,
];

lazy_static! {
    static ref RULE_PATTERNS: Vec<(ErrorRule, Regex)> = RULES
        .iter()
        .map(|rule| (*rule, Regex::new(rule.pattern()).expect("static rule pattern")))
        .collect();
}

/// Partial solution produced by a rule; keys are filled in by the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionTemplate {
    pub kind: SolutionKind,
    pub priority: u8,
    pub action: Option<SolutionAction>,
    pub action_params: BTreeMap<String, String>,
}

impl SolutionTemplate {
    fn manual(priority: u8) -> Self {
        Self {
            kind: SolutionKind::Manual,
            priority,
            action: None,
            action_params: BTreeMap::new(),
        }
    }

    fn automatic(priority: u8, action: SolutionAction) -> Self {
        Self {
            kind: SolutionKind::Automatic,
            priority,
            action: Some(action),
            action_params: BTreeMap::new(),
        }
    }

    fn link(priority: u8) -> Self {
        Self {
            kind: SolutionKind::Link,
            priority,
            action: None,
            action_params: BTreeMap::new(),
        }
    }

    fn with_param(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.action_params.insert(key.to_string(), value.to_string());
        }
        self
    }
}

/// What a rule derives from the error and its context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub message_key: &'static str,
    pub message_params: BTreeMap<String, String>,
    pub solutions: Vec<SolutionTemplate>,
}

impl ErrorRule {
    /// Case-insensitive pattern tested against the raw message
    pub fn pattern(&self) -> &'static str {
        match self {
            ErrorRule::InsufficientFunds => {
                r"(?i)insufficient funds|insufficient ether|insufficient balance"
            }
            ErrorRule::TransactionRejected => r"(?i)user rejected|denied transaction|user denied",
            ErrorRule::SimulationFailed => {
                r"(?i)simulation failed|execution reverted|unknown signature"
            }
            ErrorRule::ConnectionFailed => {
                r"(?i)network error|fetch failed|connection failed|timeout"
            }
            ErrorRule::CompilationFailed => r"(?i)compilation failed|solidity error|syntax error",
            ErrorRule::GasLimit => r"(?i)gas required exceeds allowance|out of gas|gas limit",
            ErrorRule::InvalidInput => {
                r"(?i)invalid address|invalid parameter|missing required field"
            }
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorRule::InsufficientFunds | ErrorRule::TransactionRejected => ErrorCategory::Wallet,
            ErrorRule::SimulationFailed | ErrorRule::GasLimit => ErrorCategory::Deployment,
            ErrorRule::ConnectionFailed => ErrorCategory::Network,
            ErrorRule::CompilationFailed => ErrorCategory::Compilation,
            ErrorRule::InvalidInput => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorRule::InsufficientFunds
            | ErrorRule::SimulationFailed
            | ErrorRule::CompilationFailed
            | ErrorRule::GasLimit => ErrorSeverity::High,
            ErrorRule::TransactionRejected
            | ErrorRule::ConnectionFailed
            | ErrorRule::InvalidInput => ErrorSeverity::Medium,
        }
    }

    pub fn title_key(&self) -> &'static str {
        match self {
            ErrorRule::InsufficientFunds => "smartErrors.wallet.insufficientFunds.title",
            ErrorRule::TransactionRejected => "smartErrors.wallet.transactionRejected.title",
            ErrorRule::SimulationFailed => "smartErrors.deployment.simulationFailed.title",
            ErrorRule::ConnectionFailed => "smartErrors.network.connectionFailed.title",
            ErrorRule::CompilationFailed => "smartErrors.compilation.failed.title",
            ErrorRule::GasLimit => "smartErrors.deployment.gasLimit.title",
            ErrorRule::InvalidInput => "smartErrors.validation.invalidInput.title",
        }
    }

    /// Derive message key, parameters and solutions from the context
    pub fn detect(&self, context: &ErrorContext) -> Detection {
        let network = context.network.as_deref().filter(|n| !n.is_empty());

        match self {
            ErrorRule::InsufficientFunds => Detection {
                message_key: "smartErrors.wallet.insufficientFunds.message",
                message_params: params(&[
                    ("estimatedCost", or(context.estimated_cost.as_deref(), "?")),
                    ("userBalance", or(context.user_balance.as_deref(), "?")),
                    ("network", or(network, "blockchain")),
                ]),
                solutions: vec![
                    SolutionTemplate::manual(1),
                    SolutionTemplate::manual(2).with_param("network", network),
                    SolutionTemplate::automatic(3, SolutionAction::SuggestFeatureRemoval),
                ],
            },
            ErrorRule::TransactionRejected => Detection {
                message_key: "smartErrors.wallet.transactionRejected.message",
                message_params: BTreeMap::new(),
                solutions: vec![SolutionTemplate::manual(1), SolutionTemplate::manual(2)],
            },
            ErrorRule::SimulationFailed => Detection {
                message_key: "smartErrors.deployment.simulationFailed.message",
                message_params: params(&[("network", or(network, "blockchain"))]),
                solutions: vec![
                    SolutionTemplate::automatic(1, SolutionAction::CheckConnectivity),
                    SolutionTemplate::automatic(2, SolutionAction::IncreaseGasLimit),
                    SolutionTemplate::manual(3),
                ],
            },
            ErrorRule::ConnectionFailed => Detection {
                message_key: "smartErrors.network.connectionFailed.message",
                message_params: params(&[("network", or(network, "blockchain"))]),
                solutions: vec![
                    SolutionTemplate::manual(1),
                    SolutionTemplate::automatic(2, SolutionAction::SwitchRpc),
                    SolutionTemplate::manual(3),
                ],
            },
            ErrorRule::CompilationFailed => {
                let features = context
                    .features
                    .as_ref()
                    .filter(|f| !f.is_empty())
                    .map(|f| f.join(", "));
                Detection {
                    message_key: "smartErrors.compilation.failed.message",
                    message_params: params(&[
                        ("template", or(context.template.as_deref(), "contract")),
                        ("features", or(features.as_deref(), "none")),
                    ]),
                    solutions: vec![
                        SolutionTemplate::manual(1),
                        SolutionTemplate::automatic(2, SolutionAction::SimplifyFeatures),
                        SolutionTemplate::link(3),
                    ],
                }
            }
            ErrorRule::GasLimit => Detection {
                message_key: "smartErrors.deployment.gasLimit.message",
                message_params: params(&[("gasPrice", or(context.gas_price.as_deref(), "?"))]),
                solutions: vec![
                    SolutionTemplate::automatic(1, SolutionAction::IncreaseGasLimit),
                    SolutionTemplate::manual(2),
                    SolutionTemplate::manual(3),
                ],
            },
            ErrorRule::InvalidInput => Detection {
                message_key: "smartErrors.validation.invalidInput.message",
                message_params: BTreeMap::new(),
                solutions: vec![SolutionTemplate::manual(1), SolutionTemplate::manual(2)],
            },
        }
    }
}

/// Rule-table error classifier
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// First rule matching `message`, if any
    pub fn match_rule(message: &str) -> Option<ErrorRule> {
        RULE_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(message))
            .map(|(rule, _)| *rule)
    }

    /// Classify a raw error message
    pub fn classify(message: &str, context: ErrorContext) -> ClassifiedError {
        match Self::match_rule(message) {
            Some(rule) => {
                debug!(rule = ?rule, "🧠 Error matched rule");
                Self::from_rule(rule, message, context)
            }
            None => {
                debug!("🧠 No rule matched, using generic classification");
                Self::generic(message, context)
            }
        }
    }

    /// Classify anything printable (uses its `Display` text)
    pub fn classify_error<E: Display + ?Sized>(error: &E, context: ErrorContext) -> ClassifiedError {
        Self::classify(&error.to_string(), context)
    }

    /// Fallback classification used when no rule matches
    pub fn generic(message: &str, context: ErrorContext) -> ClassifiedError {
        let solutions = [
            (SolutionKind::Manual, 1),
            (SolutionKind::Manual, 2),
            (SolutionKind::Link, 3),
        ]
        .into_iter()
        .map(|(kind, priority)| Solution {
            title_key: format!("smartErrors.solutions.generic.solution{}.title", priority),
            description_key: format!(
                "smartErrors.solutions.generic.solution{}.description",
                priority
            ),
            kind,
            priority,
            action: None,
            action_params: BTreeMap::new(),
        })
        .collect();

        ClassifiedError {
            id: generate_error_id(),
            category: ErrorCategory::System,
            severity: ErrorSeverity::Medium,
            title_key: "smartErrors.generic.title".to_string(),
            message_key: "smartErrors.generic.message".to_string(),
            message_params: BTreeMap::new(),
            solutions,
            context: Some(context),
            technical: message.to_string(),
            help_url: Some(help_url(ErrorCategory::System)),
            can_retry: true,
        }
    }

    fn from_rule(rule: ErrorRule, message: &str, context: ErrorContext) -> ClassifiedError {
        let category = rule.category();
        let detection = rule.detect(&context);

        let solutions = detection
            .solutions
            .into_iter()
            .enumerate()
            .map(|(index, template)| Solution {
                title_key: solution_key(category, index, "title"),
                description_key: solution_key(category, index, "description"),
                kind: template.kind,
                priority: template.priority,
                action: template.action,
                action_params: template.action_params,
            })
            .collect();

        ClassifiedError {
            id: generate_error_id(),
            category,
            severity: rule.severity(),
            title_key: rule.title_key().to_string(),
            message_key: detection.message_key.to_string(),
            message_params: detection.message_params,
            solutions,
            context: Some(context),
            technical: message.to_string(),
            help_url: Some(help_url(category)),
            can_retry: category.is_retryable(),
        }
    }
}

// Helper functions

fn solution_key(category: ErrorCategory, index: usize, field: &str) -> String {
    format!(
        "smartErrors.solutions.{}.solution{}.{}",
        category.as_str(),
        index + 1,
        field
    )
}

fn help_url(category: ErrorCategory) -> String {
    format!("{}#{}", HELP_URL_BASE, category.help_anchor())
}

/// `err_<unix ms>_<random base36>`
pub fn generate_error_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("err_{}_{}", now_millis(), suffix)
}

/// Blank values count as missing
fn or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

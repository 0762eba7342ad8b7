//! Smart error data model
//!
//! A `ClassifiedError` is the user-facing interpretation of a raw error
//! caught by the host application. It only carries localization keys and
//! interpolation parameters; rendering text is the UI's job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Broad category of a classified error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Wallet,
    Network,
    Compilation,
    Deployment,
    Validation,
    System,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 6] = [
        ErrorCategory::Wallet,
        ErrorCategory::Network,
        ErrorCategory::Compilation,
        ErrorCategory::Deployment,
        ErrorCategory::Validation,
        ErrorCategory::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Wallet => "wallet",
            ErrorCategory::Network => "network",
            ErrorCategory::Compilation => "compilation",
            ErrorCategory::Deployment => "deployment",
            ErrorCategory::Validation => "validation",
            ErrorCategory::System => "system",
        }
    }

    /// Whether the UI should offer a retry of the failing action
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::Network | ErrorCategory::System | ErrorCategory::Deployment
        )
    }

    /// Troubleshooting anchor for this category
    pub fn help_anchor(&self) -> &'static str {
        match self {
            ErrorCategory::Wallet => "wallet-issues",
            ErrorCategory::Network => "network-issues",
            ErrorCategory::Compilation => "compilation-issues",
            ErrorCategory::Deployment => "deployment-issues",
            ErrorCategory::Validation => "validation-issues",
            ErrorCategory::System => "general-issues",
        }
    }
}

/// How bad a classified error is for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Warning
    Low,
    /// Recoverable error
    Medium,
    /// Critical error
    High,
    /// Total failure
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Low => "low",
            ErrorSeverity::Medium => "medium",
            ErrorSeverity::High => "high",
            ErrorSeverity::Critical => "critical",
        }
    }
}

/// How a solution is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionKind {
    /// The user follows the instructions
    Manual,
    /// The host can run `action` on the user's behalf
    Automatic,
    /// Points to external documentation
    Link,
}

/// Actions the host application knows how to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionAction {
    SuggestFeatureRemoval,
    CheckConnectivity,
    IncreaseGasLimit,
    SwitchRpc,
    SimplifyFeatures,
}

impl SolutionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionAction::SuggestFeatureRemoval => "suggest_feature_removal",
            SolutionAction::CheckConnectivity => "check_connectivity",
            SolutionAction::IncreaseGasLimit => "increase_gas_limit",
            SolutionAction::SwitchRpc => "switch_rpc",
            SolutionAction::SimplifyFeatures => "simplify_features",
        }
    }
}

/// One remediation suggestion attached to a classified error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub title_key: String,
    pub description_key: String,
    #[serde(rename = "type")]
    pub kind: SolutionKind,
    /// 1-based rank, lower comes first
    pub priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<SolutionAction>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub action_params: BTreeMap<String, String>,
}

/// Ambient data used to parametrize error messages
///
/// Every field is optional; the enricher fills what it can.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

/// Structured interpretation of a raw error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    /// `err_<unix ms>_<random base36>`
    pub id: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub title_key: String,
    pub message_key: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub message_params: BTreeMap<String, String>,
    pub solutions: Vec<Solution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Raw error text as caught
    pub technical: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
    pub can_retry: bool,
}

impl ClassifiedError {
    /// Solutions the host can run without user input, in priority order
    pub fn automatic_solutions(&self) -> impl Iterator<Item = &Solution> {
        self.solutions
            .iter()
            .filter(|s| s.kind == SolutionKind::Automatic && s.action.is_some())
    }
}

/// How the user got past an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMethod {
    Automatic,
    Manual,
    Retry,
    Support,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Automatic => "automatic",
            ResolutionMethod::Manual => "manual",
            ResolutionMethod::Retry => "retry",
            ResolutionMethod::Support => "support",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_categories() {
        let retryable: Vec<_> = ErrorCategory::ALL
            .iter()
            .filter(|c| c.is_retryable())
            .collect();
        assert_eq!(
            retryable,
            vec![
                &ErrorCategory::Network,
                &ErrorCategory::Deployment,
                &ErrorCategory::System
            ]
        );
    }

    #[test]
    fn test_context_wire_format() {
        let ctx = ErrorContext {
            user_balance: Some("0.1 ETH".to_string()),
            chain_id: Some(1),
            ..Default::default()
        };
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["userBalance"], "0.1 ETH");
        assert_eq!(json["chainId"], 1);
        assert!(json.get("template").is_none());
    }

    #[test]
    fn test_solution_kind_serializes_as_type() {
        let solution = Solution {
            title_key: "t".to_string(),
            description_key: "d".to_string(),
            kind: SolutionKind::Link,
            priority: 3,
            action: None,
            action_params: BTreeMap::new(),
        };
        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["type"], "link");
        assert!(json.get("action").is_none());
    }
}

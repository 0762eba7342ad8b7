//! Smart error handling flow
//!
//! Wires the pieces together for callers that just caught an error:
//! build context, classify, record telemetry. Automatic solutions are run
//! through an injected `ActionHandler`.

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::classifier::ErrorClassifier;
use crate::core::enricher::{ChainDataSource, ContextRequest, ErrorContextEnricher};
use crate::models::errors::{AppError, AppResult};
use crate::models::smart_error::{
    ClassifiedError, ErrorContext, ResolutionMethod, Solution, SolutionAction, SolutionKind,
};
use crate::utils::telemetry::{ErrorTelemetry, TrackOptions};

/// Executes automatic solution actions on the host side
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(
        &self,
        action: SolutionAction,
        params: &BTreeMap<String, String>,
    ) -> AppResult<()>;
}

/// Enrich, classify and track in one call
pub struct SmartErrorHandler {
    telemetry: Arc<ErrorTelemetry>,
    chain: Option<Arc<dyn ChainDataSource>>,
    actions: Option<Arc<dyn ActionHandler>>,
}

impl SmartErrorHandler {
    pub fn new(telemetry: Arc<ErrorTelemetry>) -> Self {
        Self {
            telemetry,
            chain: None,
            actions: None,
        }
    }

    pub fn with_chain_source(mut self, chain: Arc<dyn ChainDataSource>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_action_handler(mut self, actions: Arc<dyn ActionHandler>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn telemetry(&self) -> &Arc<ErrorTelemetry> {
        &self.telemetry
    }

    /// Handle a raw error message
    ///
    /// `extra` fields override the enriched context. The classified error is
    /// tracked before being returned.
    pub async fn handle(
        &self,
        message: &str,
        request: ContextRequest,
        extra: Option<ErrorContext>,
        mut options: TrackOptions,
    ) -> ClassifiedError {
        let template = request.template.clone();
        let features = request.features.clone();
        let chain_id = request.chain_id;

        let context = ErrorContextEnricher::build(request, self.chain.as_deref()).await;
        let context = match extra {
            Some(extra) => ErrorContextEnricher::enrich(context, extra),
            None => context,
        };

        let error = ErrorClassifier::classify(message, context);

        info!(
            id = %error.id,
            category = error.category.as_str(),
            severity = error.severity.as_str(),
            "🔍 Smart error handled"
        );

        if let Some(template) = template {
            options.properties.insert("template".into(), json!(template));
        }
        if let Some(features) = features {
            options.properties.insert("features".into(), json!(features));
        }
        if let Some(chain_id) = chain_id {
            options.properties.insert("chainId".into(), json!(chain_id));
        }
        self.telemetry.track(&error, options);

        error
    }

    /// Same as `handle` for any printable error
    pub async fn handle_error<E: Display + ?Sized>(
        &self,
        error: &E,
        request: ContextRequest,
    ) -> ClassifiedError {
        self.handle(&error.to_string(), request, None, TrackOptions::default())
            .await
    }

    /// Record how the user got past an error
    pub fn resolve(&self, error_id: &str, method: ResolutionMethod) -> bool {
        self.telemetry.track_resolution(error_id, method)
    }

    /// Run an automatic solution; a success marks the error resolved
    pub async fn run_solution(&self, error: &ClassifiedError, solution: &Solution) -> AppResult<()> {
        let action = match (solution.kind, solution.action) {
            (SolutionKind::Automatic, Some(action)) => action,
            _ => {
                return Err(AppError::action_unavailable(format!(
                    "Solution {} has no automatic action",
                    solution.title_key
                )))
            }
        };

        let handler = self
            .actions
            .as_ref()
            .ok_or_else(|| AppError::action_unavailable("No action handler registered"))?;

        match handler.execute(action, &solution.action_params).await {
            Ok(()) => {
                info!("✅ Automatic solution {} succeeded", action.as_str());
                self.resolve(&error.id, ResolutionMethod::Automatic);
                Ok(())
            }
            Err(e) => {
                warn!("⚠️ Automatic solution {} failed: {}", action.as_str(), e);
                Err(AppError::action_failed(action.as_str(), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use crate::models::smart_error::ErrorCategory;
    use alloy_primitives::U256;
    use std::sync::Mutex;

    struct FixedChain;

    #[async_trait]
    impl ChainDataSource for FixedChain {
        async fn gas_price(&self) -> AppResult<U256> {
            Ok(U256::from(1_000_000_000u64))
        }

        async fn balance(&self, _address: &str) -> AppResult<U256> {
            Ok(U256::ZERO)
        }
    }

    #[derive(Default)]
    struct RecordingActions {
        executed: Mutex<Vec<SolutionAction>>,
    }

    #[async_trait]
    impl ActionHandler for RecordingActions {
        async fn execute(
            &self,
            action: SolutionAction,
            _params: &BTreeMap<String, String>,
        ) -> AppResult<()> {
            self.executed.lock().unwrap().push(action);
            Ok(())
        }
    }

    struct BrokenActions;

    #[async_trait]
    impl ActionHandler for BrokenActions {
        async fn execute(
            &self,
            _action: SolutionAction,
            _params: &BTreeMap<String, String>,
        ) -> AppResult<()> {
            Err(AppError::rpc_connection_failed("wallet offline"))
        }
    }

    #[tokio::test]
    async fn test_handle_tracks_error() {
        let telemetry = Arc::new(ErrorTelemetry::new(10));
        let handler = SmartErrorHandler::new(telemetry.clone()).with_chain_source(Arc::new(FixedChain));

        let request = ContextRequest {
            chain_id: Some(1),
            ..Default::default()
        };
        let error = handler
            .handle("out of gas", request, None, TrackOptions::default())
            .await;

        assert_eq!(error.category, ErrorCategory::Deployment);
        assert_eq!(error.message_params["gasPrice"], "1.00 gwei");
        assert_eq!(telemetry.len(), 1);
    }

    #[tokio::test]
    async fn test_extra_context_overrides() {
        let handler = SmartErrorHandler::new(Arc::new(ErrorTelemetry::new(10)));
        let request = ContextRequest {
            chain_id: Some(1),
            ..Default::default()
        };
        let extra = ErrorContext {
            network: Some("Staging".to_string()),
            ..Default::default()
        };
        let error = handler
            .handle("fetch failed", request, Some(extra), TrackOptions::default())
            .await;
        assert_eq!(error.message_params["network"], "Staging");
    }

    #[tokio::test]
    async fn test_run_automatic_solution() {
        let telemetry = Arc::new(ErrorTelemetry::new(10));
        let actions = Arc::new(RecordingActions::default());
        let handler = SmartErrorHandler::new(telemetry.clone()).with_action_handler(actions.clone());

        let error = handler
            .handle_error("network error", ContextRequest::default())
            .await;
        let solution = error.automatic_solutions().next().cloned().unwrap();
        handler.run_solution(&error, &solution).await.unwrap();

        assert_eq!(*actions.executed.lock().unwrap(), vec![SolutionAction::SwitchRpc]);
        assert!(telemetry.events()[0].resolved);

        let manual = &error.solutions[0];
        assert!(handler.run_solution(&error, manual).await.is_err());
    }

    #[tokio::test]
    async fn test_run_solution_without_handler() {
        let handler = SmartErrorHandler::new(Arc::new(ErrorTelemetry::new(10)));
        let error = handler
            .handle_error("out of gas", ContextRequest::default())
            .await;
        let solution = error.solutions[0].clone();
        assert!(handler.run_solution(&error, &solution).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_action_leaves_error_unresolved() {
        let telemetry = Arc::new(ErrorTelemetry::new(10));
        let handler =
            SmartErrorHandler::new(telemetry.clone()).with_action_handler(Arc::new(BrokenActions));

        let error = handler
            .handle_error("fetch failed", ContextRequest::default())
            .await;
        let solution = error.automatic_solutions().next().cloned().unwrap();

        let err = handler.run_solution(&error, &solution).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ActionFailed);
        assert!(err.message.contains("wallet offline"));
        assert!(!telemetry.events()[0].resolved);
    }
}

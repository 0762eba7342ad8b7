//! Error Telemetry Module
//!
//! In-memory log of classified errors used for:
//! - Error statistics (by category, severity, most common titles)
//! - Resolution tracking (how users got past an error)
//! - Export snapshots for offline analysis
//!
//! Privacy-first: wallet addresses are masked before anything leaves the log

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::core::enricher::ErrorContextEnricher;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::smart_error::{ClassifiedError, ErrorCategory, ErrorSeverity, ResolutionMethod};
use crate::utils::constants::{
    now_millis, DEFAULT_STATS_WINDOW_MS, DEFAULT_TELEMETRY_CAPACITY, TELEMETRY_EXPORT_VERSION,
};

/// Event names forwarded to analytics sinks
pub const EVENT_ERROR_OCCURRED: &str = "smart_error_occurred";
pub const EVENT_ERROR_RESOLVED: &str = "smart_error_resolved";

const TOP_SOLUTIONS: usize = 5;
const MOST_COMMON: usize = 10;

/// One tracked error occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub error: ClassifiedError,
    /// Unix timestamp (ms)
    pub timestamp: i64,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_method: Option<ResolutionMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Caller-supplied extras for `track`
#[derive(Debug, Clone, Default)]
pub struct TrackOptions {
    pub user_agent: Option<String>,
    pub url: Option<String>,
    /// Extra flat properties forwarded to sinks
    pub properties: Map<String, Value>,
}

/// Count of one suggested solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionCount {
    pub solution: String,
    pub count: usize,
}

/// Frequency of one error title within the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonError {
    pub pattern: String,
    pub count: usize,
    pub percentage: f64,
}

/// Aggregated statistics over a time window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStats {
    /// Events in the log (all-time)
    pub total: usize,
    /// Events newer than `now - window`
    pub in_window: usize,
    pub by_category: BTreeMap<ErrorCategory, usize>,
    pub by_severity: BTreeMap<ErrorSeverity, usize>,
    pub top_solutions: Vec<SolutionCount>,
    /// Resolved / window events, in percent
    pub resolution_rate: f64,
    pub most_common: Vec<CommonError>,
}

/// All-time ranking entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopError {
    pub title_key: String,
    pub count: usize,
    pub last_occurrence: i64,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryExport<'a> {
    version: &'a str,
    timestamp: i64,
    events: Vec<TelemetryEvent>,
    stats: ErrorStats,
}

/// Destination for forwarded telemetry events
pub trait AnalyticsSink: Send + Sync {
    fn name(&self) -> &str;
    fn track(&self, event: &str, properties: &Map<String, Value>) -> AppResult<()>;
}

/// Sink writing every event to the tracing log
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn track(&self, event: &str, properties: &Map<String, Value>) -> AppResult<()> {
        let properties = Value::Object(properties.clone());
        info!(target: "analytics", event = %event, properties = %properties, "📈 Analytics event");
        Ok(())
    }
}

/// Bounded error log with FIFO eviction
pub struct ErrorTelemetry {
    events: RwLock<VecDeque<TelemetryEvent>>,
    capacity: usize,
    sinks: RwLock<Vec<Arc<dyn AnalyticsSink>>>,
}

impl ErrorTelemetry {
    /// Create a log holding at most `capacity` events (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            sinks: RwLock::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register an analytics sink
    pub fn add_sink(&self, sink: Arc<dyn AnalyticsSink>) {
        if let Ok(mut sinks) = self.sinks.write() {
            debug!("📈 Analytics sink registered: {}", sink.name());
            sinks.push(sink);
        }
    }

    /// Append an event, evicting the oldest once over capacity
    pub fn track(&self, error: &ClassifiedError, options: TrackOptions) {
        let event = TelemetryEvent {
            error: error.clone(),
            timestamp: now_millis(),
            resolved: false,
            resolution_method: None,
            user_agent: options.user_agent,
            url: options.url,
        };

        if let Ok(mut events) = self.events.write() {
            events.push_back(event);
            while events.len() > self.capacity {
                events.pop_front();
            }
        }

        debug!(
            id = %error.id,
            category = error.category.as_str(),
            severity = error.severity.as_str(),
            "🚨 Smart error tracked: {}",
            error.title_key
        );

        let mut properties = occurred_properties(error);
        properties.extend(options.properties);
        self.forward(EVENT_ERROR_OCCURRED, &properties);
    }

    /// Mark the most recent event with `error_id` as resolved; unknown ids are ignored
    pub fn track_resolution(&self, error_id: &str, method: ResolutionMethod) -> bool {
        let found = match self.events.write() {
            Ok(mut events) => match events.iter_mut().rev().find(|e| e.error.id == error_id) {
                Some(event) => {
                    event.resolved = true;
                    event.resolution_method = Some(method);
                    true
                }
                None => false,
            },
            Err(_) => false,
        };

        if found {
            let mut properties = Map::new();
            properties.insert("errorId".into(), json!(error_id));
            properties.insert("resolutionMethod".into(), json!(method.as_str()));
            properties.insert("timestamp".into(), json!(now_millis()));
            self.forward(EVENT_ERROR_RESOLVED, &properties);
        } else {
            debug!("Resolution for unknown error id {} ignored", error_id);
        }

        found
    }

    /// Statistics over events newer than `now - window_ms`
    pub fn stats(&self, window_ms: i64) -> ErrorStats {
        let events = match self.events.read() {
            Ok(events) => events,
            Err(_) => return ErrorStats::default(),
        };
        compute_stats(&events, now_millis().saturating_sub(window_ms))
    }

    /// All-time ranking of error titles by occurrence count
    pub fn top_errors(&self, limit: usize) -> Vec<TopError> {
        let events = match self.events.read() {
            Ok(events) => events,
            Err(_) => return Vec::new(),
        };

        let mut by_title: HashMap<&str, TopError> = HashMap::new();
        for event in events.iter() {
            by_title
                .entry(event.error.title_key.as_str())
                .and_modify(|entry| {
                    entry.count += 1;
                    entry.last_occurrence = entry.last_occurrence.max(event.timestamp);
                })
                .or_insert_with(|| TopError {
                    title_key: event.error.title_key.clone(),
                    count: 1,
                    last_occurrence: event.timestamp,
                    category: event.error.category,
                    severity: event.error.severity,
                });
        }

        let mut ranking: Vec<TopError> = by_title.into_values().collect();
        ranking.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.title_key.cmp(&b.title_key)));
        ranking.truncate(limit);
        ranking
    }

    /// Pretty JSON snapshot of all events (sanitized) plus 24h stats
    pub fn export(&self) -> AppResult<String> {
        let events = self
            .events
            .read()
            .map_err(|_| AppError::new(ErrorCode::TelemetryExportFailed, "Telemetry lock poisoned"))?;

        let sanitized: Vec<TelemetryEvent> = events
            .iter()
            .map(|event| {
                let mut event = event.clone();
                let context = event.error.context.take().unwrap_or_default();
                event.error.context = Some(ErrorContextEnricher::sanitize(&context));
                event
            })
            .collect();

        let now = now_millis();
        let export = TelemetryExport {
            version: TELEMETRY_EXPORT_VERSION,
            timestamp: now,
            stats: compute_stats(&events, now - DEFAULT_STATS_WINDOW_MS),
            events: sanitized,
        };

        serde_json::to_string_pretty(&export).map_err(|e| {
            AppError::new(ErrorCode::TelemetryExportFailed, format!("Serialization failed: {}", e))
        })
    }

    /// Drop every event
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the log, oldest first
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .read()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn forward(&self, event: &str, properties: &Map<String, Value>) {
        let sinks: Vec<Arc<dyn AnalyticsSink>> = match self.sinks.read() {
            Ok(sinks) => sinks.clone(),
            Err(_) => return,
        };

        for sink in sinks {
            if let Err(e) = sink.track(event, properties) {
                warn!("⚠️ Failed to send {} to sink {}: {}", event, sink.name(), e);
            }
        }
    }
}

impl Default for ErrorTelemetry {
    fn default() -> Self {
        Self::new(DEFAULT_TELEMETRY_CAPACITY)
    }
}

fn occurred_properties(error: &ClassifiedError) -> Map<String, Value> {
    let context = error.context.as_ref().map(ErrorContextEnricher::sanitize);

    let mut properties = Map::new();
    properties.insert("errorId".into(), json!(error.id));
    properties.insert("category".into(), json!(error.category.as_str()));
    properties.insert("severity".into(), json!(error.severity.as_str()));
    properties.insert("titleKey".into(), json!(error.title_key));
    properties.insert("messageKey".into(), json!(error.message_key));
    properties.insert("solutionsCount".into(), json!(error.solutions.len()));
    properties.insert("canRetry".into(), json!(error.can_retry));

    if let Some(ctx) = context {
        if let Some(template) = &ctx.template {
            properties.insert("template".into(), json!(template));
        }
        if let Some(network) = &ctx.network {
            properties.insert("network".into(), json!(network));
        }
        if let Some(chain_id) = ctx.chain_id {
            properties.insert("chainId".into(), json!(chain_id));
        }
        if let Some(address) = &ctx.user_address {
            properties.insert("userAddress".into(), json!(address));
        }
    }

    properties
}

fn compute_stats(events: &VecDeque<TelemetryEvent>, since: i64) -> ErrorStats {
    let recent: Vec<&TelemetryEvent> = events.iter().filter(|e| e.timestamp > since).collect();

    let mut stats = ErrorStats {
        total: events.len(),
        in_window: recent.len(),
        ..Default::default()
    };

    let mut solution_counts: HashMap<&str, usize> = HashMap::new();
    let mut title_counts: HashMap<&str, usize> = HashMap::new();

    for event in &recent {
        *stats.by_category.entry(event.error.category).or_insert(0) += 1;
        *stats.by_severity.entry(event.error.severity).or_insert(0) += 1;
        *title_counts.entry(event.error.title_key.as_str()).or_insert(0) += 1;
        for solution in &event.error.solutions {
            *solution_counts.entry(solution.title_key.as_str()).or_insert(0) += 1;
        }
    }

    if !recent.is_empty() {
        let resolved = recent.iter().filter(|e| e.resolved).count();
        stats.resolution_rate = resolved as f64 / recent.len() as f64 * 100.0;
    }

    stats.top_solutions = rank(solution_counts, TOP_SOLUTIONS)
        .into_iter()
        .map(|(solution, count)| SolutionCount { solution, count })
        .collect();

    stats.most_common = rank(title_counts, MOST_COMMON)
        .into_iter()
        .map(|(pattern, count)| CommonError {
            pattern,
            count,
            percentage: count as f64 / recent.len() as f64 * 100.0,
        })
        .collect();

    stats
}

/// Sort by count desc (ties by key) and keep `limit`
fn rank(counts: HashMap<&str, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(key, count)| (key.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::ErrorClassifier;
    use crate::models::smart_error::ErrorContext;
    use std::sync::Mutex;

    fn classified(message: &str) -> ClassifiedError {
        ErrorClassifier::classify(message, ErrorContext::default())
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl AnalyticsSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn track(&self, event: &str, properties: &Map<String, Value>) -> AppResult<()> {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), properties.clone()));
            Ok(())
        }
    }

    struct FailingSink;

    impl AnalyticsSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn track(&self, _event: &str, _properties: &Map<String, Value>) -> AppResult<()> {
            Err(AppError::sink_failed("failing", "unreachable"))
        }
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let telemetry = ErrorTelemetry::new(3);
        let ids: Vec<String> = (0..5)
            .map(|_| {
                let err = classified("out of gas");
                telemetry.track(&err, TrackOptions::default());
                err.id
            })
            .collect();

        let kept: Vec<String> = telemetry.events().into_iter().map(|e| e.error.id).collect();
        assert_eq!(kept, ids[2..].to_vec());
        assert_eq!(telemetry.len(), 3);
    }

    #[test]
    fn test_resolution_marks_event() {
        let telemetry = ErrorTelemetry::new(10);
        let err = classified("user rejected");
        telemetry.track(&err, TrackOptions::default());
        telemetry.track(&classified("timeout"), TrackOptions::default());

        assert!(telemetry.track_resolution(&err.id, ResolutionMethod::Retry));
        assert!(!telemetry.track_resolution("err_0_missing", ResolutionMethod::Manual));

        let stats = telemetry.stats(DEFAULT_STATS_WINDOW_MS);
        assert_eq!(stats.in_window, 2);
        assert!((stats.resolution_rate - 50.0).abs() < f64::EPSILON);
        let resolved = &telemetry.events()[0];
        assert_eq!(resolved.resolution_method, Some(ResolutionMethod::Retry));
    }

    #[test]
    fn test_stats_breakdown() {
        let telemetry = ErrorTelemetry::new(10);
        for msg in ["out of gas", "out of gas", "fetch failed"] {
            telemetry.track(&classified(msg), TrackOptions::default());
        }

        let stats = telemetry.stats(DEFAULT_STATS_WINDOW_MS);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_category[&ErrorCategory::Deployment], 2);
        assert_eq!(stats.by_category[&ErrorCategory::Network], 1);
        assert_eq!(stats.by_severity[&ErrorSeverity::High], 2);
        assert_eq!(stats.most_common[0].pattern, "smartErrors.deployment.gasLimit.title");
        assert!((stats.most_common[0].percentage - 200.0 / 3.0).abs() < 1e-9);
        assert!(stats.top_solutions.len() <= TOP_SOLUTIONS);
        assert_eq!(stats.top_solutions[0].count, 2);
    }

    #[test]
    fn test_stats_window_excludes_old_events() {
        let telemetry = ErrorTelemetry::new(10);
        telemetry.track(&classified("out of gas"), TrackOptions::default());
        std::thread::sleep(std::time::Duration::from_millis(20));

        let stats = telemetry.stats(5);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.in_window, 0);
        assert!(stats.by_category.is_empty());
        assert!(stats.most_common.is_empty());
        assert_eq!(stats.resolution_rate, 0.0);

        telemetry.track(&classified("fetch failed"), TrackOptions::default());
        let stats = telemetry.stats(DEFAULT_STATS_WINDOW_MS);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.in_window, 2);
    }

    #[test]
    fn test_stats_extreme_windows() {
        let telemetry = ErrorTelemetry::new(10);
        telemetry.track(&classified("timeout"), TrackOptions::default());

        assert_eq!(telemetry.stats(i64::MIN).in_window, 0);
        assert_eq!(telemetry.stats(i64::MAX).in_window, 1);
    }

    #[test]
    fn test_empty_stats() {
        let stats = ErrorTelemetry::default().stats(DEFAULT_STATS_WINDOW_MS);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.resolution_rate, 0.0);
        assert!(stats.most_common.is_empty());
    }

    #[test]
    fn test_top_errors_all_time() {
        let telemetry = ErrorTelemetry::new(10);
        for msg in ["timeout", "user denied", "timeout"] {
            telemetry.track(&classified(msg), TrackOptions::default());
        }
        let top = telemetry.top_errors(1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].title_key, "smartErrors.network.connectionFailed.title");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[0].category, ErrorCategory::Network);
    }

    #[test]
    fn test_export_sanitizes_context() {
        let telemetry = ErrorTelemetry::new(10);
        let context = ErrorContext {
            user_address: Some("0x1234567890abcdef1234567890abcdef12345678".to_string()),
            ..Default::default()
        };
        telemetry.track(
            &ErrorClassifier::classify("insufficient funds", context),
            TrackOptions::default(),
        );

        let json = telemetry.export().unwrap();
        assert!(json.contains("0x1234...5678"));
        assert!(!json.contains("0x1234567890abcdef"));

        let doc: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["version"], "1.0");
        assert_eq!(doc["events"].as_array().unwrap().len(), 1);
        assert_eq!(doc["stats"]["total"], 1);
    }

    #[test]
    fn test_sinks_receive_events() {
        let telemetry = ErrorTelemetry::new(10);
        let sink = Arc::new(RecordingSink::default());
        telemetry.add_sink(Arc::new(FailingSink));
        telemetry.add_sink(sink.clone());

        let err = classified("syntax error");
        let mut options = TrackOptions::default();
        options.properties.insert("fallback".into(), json!(false));
        telemetry.track(&err, options);
        telemetry.track_resolution(&err.id, ResolutionMethod::Manual);

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, EVENT_ERROR_OCCURRED);
        assert_eq!(events[0].1["category"], "compilation");
        assert_eq!(events[0].1["fallback"], false);
        assert_eq!(events[1].0, EVENT_ERROR_RESOLVED);
        assert_eq!(events[1].1["resolutionMethod"], "manual");
    }

    #[test]
    fn test_tracing_sink_accepts_events() {
        let telemetry = ErrorTelemetry::new(10);
        telemetry.add_sink(Arc::new(TracingSink));
        let err = classified("syntax error");
        telemetry.track(&err, TrackOptions::default());

        let mut properties = Map::new();
        properties.insert("errorId".to_string(), Value::String(err.id));
        assert!(TracingSink.track(EVENT_ERROR_OCCURRED, &properties).is_ok());
    }

    #[test]
    fn test_clear() {
        let telemetry = ErrorTelemetry::new(10);
        telemetry.track(&classified("x"), TrackOptions::default());
        telemetry.clear();
        assert!(telemetry.is_empty());
    }
}

// src/models/settings.rs

//! Resolved, immutable engine settings for one run.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::models::config::{EngineConfig, defaults};
use crate::models::PatternSet;
use crate::utils::coerce::{clean_string, coerce_string_map, ensure_list, to_float};
use crate::utils::http::merge_headers;

/// Upper bound on sources fetched at once.
pub const MAX_CONCURRENCY: usize = 10;

/// Process-wide defaults applied to every source in a run.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub default_delay_hours: f64,
    pub min_delay_hours: f64,
    pub snapshot_chars: usize,
    pub source_label: String,
    pub carrier_status_code: String,
    pub incident_prefix: String,
    pub global_headers: BTreeMap<String, String>,
    pub delay_patterns: PatternSet,
    pub ignore_patterns: PatternSet,
    pub request_timeout: Duration,
    pub concurrency: usize,
}

impl EngineSettings {
    /// Build settings from config-file defaults only.
    pub fn from_config(engine: &EngineConfig) -> Self {
        Self::resolve(engine, &Map::new())
    }

    /// Overlay the run input's engine-level keys on the config-file defaults.
    pub fn resolve(engine: &EngineConfig, payload: &Map<String, Value>) -> Self {
        let default_delay_hours = to_float(payload.get("defaultDelayHours"))
            .unwrap_or(engine.default_delay_hours);
        let min_delay_hours =
            to_float(payload.get("minDelayHours")).unwrap_or(engine.min_delay_hours);

        let snapshot_chars = to_float(payload.get("snapshotChars"))
            .filter(|v| *v >= 1.0)
            .map(|v| v as usize)
            .unwrap_or(engine.snapshot_chars);
        let snapshot_chars = if snapshot_chars == 0 {
            defaults::snapshot_chars()
        } else {
            snapshot_chars
        };

        let timeout_secs = to_float(payload.get("requestTimeoutSeconds"))
            .unwrap_or(engine.request_timeout_secs);
        let timeout_secs = if timeout_secs.is_finite() && timeout_secs > 0.0 {
            timeout_secs
        } else {
            defaults::request_timeout_secs()
        };

        // Missing, zero or non-numeric means "use the default"; any other
        // number is truncated and clamped into range.
        let concurrency = to_float(payload.get("concurrency"))
            .filter(|v| *v != 0.0)
            .map(|v| v.trunc().clamp(1.0, MAX_CONCURRENCY as f64) as usize)
            .unwrap_or(engine.concurrency)
            .clamp(1, MAX_CONCURRENCY);

        let mut global_headers = BTreeMap::new();
        merge_headers(&mut global_headers, &engine.request_headers);
        merge_headers(&mut global_headers, &coerce_string_map(payload.get("requestHeaders")));

        let delay_patterns = non_empty_or(ensure_list(payload.get("delayPatterns")), || {
            non_empty_or(engine.delay_patterns.clone(), defaults::delay_patterns)
        });
        let ignore_patterns = non_empty_or(ensure_list(payload.get("ignorePatterns")), || {
            non_empty_or(engine.ignore_patterns.clone(), defaults::ignore_patterns)
        });

        Self {
            default_delay_hours,
            min_delay_hours,
            snapshot_chars,
            source_label: clean_string(payload.get("sourceLabel"))
                .unwrap_or_else(|| engine.source_label.clone()),
            carrier_status_code: clean_string(payload.get("defaultCarrierStatusCode"))
                .unwrap_or_else(|| engine.carrier_status_code.clone()),
            incident_prefix: engine.incident_prefix.clone(),
            global_headers,
            delay_patterns: PatternSet::compile(&delay_patterns),
            ignore_patterns: PatternSet::compile(&ignore_patterns),
            request_timeout: Duration::from_secs_f64(timeout_secs),
            concurrency,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

fn non_empty_or(list: Vec<String>, fallback: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if list.is_empty() { fallback() } else { list }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(payload: Value) -> EngineSettings {
        EngineSettings::resolve(&EngineConfig::default(), payload.as_object().unwrap())
    }

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.default_delay_hours, 48.0);
        assert_eq!(settings.min_delay_hours, 24.0);
        assert_eq!(settings.snapshot_chars, 420);
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.request_timeout, Duration::from_secs(12));
        assert_eq!(settings.carrier_status_code, "IN_TRANSIT_DELAYED");
        assert_eq!(settings.delay_patterns.len(), 2);
        assert_eq!(settings.ignore_patterns.len(), 2);
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(resolve(json!({"concurrency": 50})).concurrency, 10);
        assert_eq!(resolve(json!({"concurrency": "3"})).concurrency, 3);
        assert_eq!(resolve(json!({"concurrency": 7.9})).concurrency, 7);
        assert_eq!(resolve(json!({"concurrency": -2})).concurrency, 1);
        assert_eq!(resolve(json!({"concurrency": 0.5})).concurrency, 1);
    }

    #[test]
    fn test_concurrency_default_when_unset() {
        assert_eq!(resolve(json!({})).concurrency, 4);
        assert_eq!(resolve(json!({"concurrency": 0})).concurrency, 4);
        assert_eq!(resolve(json!({"concurrency": "many"})).concurrency, 4);
        assert_eq!(resolve(json!({"concurrency": null})).concurrency, 4);
    }

    #[test]
    fn test_payload_overrides() {
        let settings = resolve(json!({
            "defaultDelayHours": 12,
            "minDelayHours": "0",
            "snapshotChars": 200,
            "sourceLabel": "ops#scan",
            "defaultCarrierStatusCode": "HELD",
            "requestTimeoutSeconds": 2.5,
            "requestHeaders": "{\"X-Api-Key\": \"k\"}",
            "delayPatterns": "stuck, held",
            "ignorePatterns": ["cancelled"]
        }));
        assert_eq!(settings.default_delay_hours, 12.0);
        assert_eq!(settings.min_delay_hours, 0.0);
        assert_eq!(settings.snapshot_chars, 200);
        assert_eq!(settings.source_label, "ops#scan");
        assert_eq!(settings.carrier_status_code, "HELD");
        assert_eq!(settings.request_timeout, Duration::from_millis(2500));
        assert_eq!(
            settings.global_headers.get("x-api-key").map(String::as_str),
            Some("k")
        );
        let delay: Vec<&str> = settings.delay_patterns.iter().map(|p| p.as_str()).collect();
        assert_eq!(delay, vec!["stuck", "held"]);
        assert_eq!(settings.ignore_patterns.len(), 1);
    }

    #[test]
    fn test_bad_timeout_uses_default() {
        let settings = resolve(json!({"requestTimeoutSeconds": -1}));
        assert_eq!(settings.request_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_blank_strings_keep_defaults() {
        let settings = resolve(json!({"sourceLabel": "  ", "delayPatterns": ""}));
        assert_eq!(settings.source_label, "delay-scan#carrier-delay-scan");
        assert_eq!(settings.delay_patterns.len(), 2);
    }
}

// src/models/source.rs

//! Per-source configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::models::{EngineSettings, PatternSet};
use crate::utils::coerce::{
    clean_string, coerce_object, coerce_string_map, ensure_list, first_present, to_float,
};
use crate::utils::http::merge_headers;

/// How a fetched document should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    /// Decide from the response content type
    #[default]
    Auto,
    Html,
    Json,
}

impl ContentMode {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("json") => ContentMode::Json,
            Some("html") => ContentMode::Html,
            _ => ContentMode::Auto,
        }
    }
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentMode::Auto => f.write_str("auto"),
            ContentMode::Html => f.write_str("html"),
            ContentMode::Json => f.write_str("json"),
        }
    }
}

/// Field locators for one candidate text: CSS selectors for HTML
/// documents, JSON paths for JSON documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLocators {
    pub selectors: Vec<String>,
    pub paths: Vec<String>,
}

/// One monitored carrier document.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub order_id: String,
    pub carrier: Option<String>,
    pub region: Option<String>,
    pub incident_id: Option<String>,
    /// Literal promised-delivery text; wins over anything extracted
    pub promised_delivery_date: Option<String>,
    /// Explicit delay that overrides any computed value when positive
    pub expected_delay_hours: Option<f64>,
    pub status: FieldLocators,
    pub eta: FieldLocators,
    pub promised: FieldLocators,
    pub delay_patterns: PatternSet,
    pub ignore_patterns: PatternSet,
    pub headers: BTreeMap<String, String>,
    pub metadata: Map<String, Value>,
    pub min_delay_hours: Option<f64>,
    pub content_mode: ContentMode,
    pub source_label: Option<String>,
    pub carrier_status_code: Option<String>,
}

impl SourceConfig {
    /// Minimal source with engine-default patterns.
    pub fn new(
        url: impl Into<String>,
        order_id: impl Into<String>,
        settings: &EngineSettings,
    ) -> Result<Self> {
        let url = url.into().trim().to_string();
        let order_id = order_id.into().trim().to_string();
        if url.is_empty() || order_id.is_empty() {
            return Err(AppError::validation(
                "Each source requires \"url\" and \"orderId\"",
            ));
        }
        Ok(Self {
            url,
            order_id,
            carrier: None,
            region: None,
            incident_id: None,
            promised_delivery_date: None,
            expected_delay_hours: None,
            status: FieldLocators::default(),
            eta: FieldLocators::default(),
            promised: FieldLocators::default(),
            delay_patterns: settings.delay_patterns.clone(),
            ignore_patterns: settings.ignore_patterns.clone(),
            headers: BTreeMap::new(),
            metadata: Map::new(),
            min_delay_hours: None,
            content_mode: ContentMode::Auto,
            source_label: None,
            carrier_status_code: None,
        })
    }

    /// Build a source from one raw input entry.
    pub fn from_value(entry: &Value, settings: &EngineSettings) -> Result<Self> {
        let payload = entry
            .as_object()
            .ok_or_else(|| AppError::validation("Each source entry must be an object"))?;

        let url = clean_string(payload.get("url")).unwrap_or_default();
        let order_id = clean_string(payload.get("orderId")).unwrap_or_default();
        let mut source = Self::new(url, order_id, settings)?;

        source.carrier = clean_string(payload.get("carrier"));
        source.region = clean_string(payload.get("region"));
        source.incident_id = clean_string(first_present(payload, &["incidentId", "incident_id"]));
        source.promised_delivery_date = clean_string(first_present(
            payload,
            &["promisedDeliveryDate", "promised_delivery"],
        ));
        source.expected_delay_hours =
            to_float(first_present(payload, &["delayHours", "expectedDelayHours"]));
        source.status = FieldLocators {
            selectors: ensure_list(payload.get("statusSelectors")),
            paths: ensure_list(payload.get("statusPaths")),
        };
        source.eta = FieldLocators {
            selectors: ensure_list(payload.get("etaSelectors")),
            paths: ensure_list(payload.get("etaPaths")),
        };
        source.promised = FieldLocators {
            selectors: ensure_list(payload.get("promisedSelectors")),
            paths: ensure_list(payload.get("promisedPaths")),
        };

        let delay = ensure_list(payload.get("delayPatterns"));
        if !delay.is_empty() {
            source.delay_patterns = PatternSet::compile(&delay);
        }
        let ignore = ensure_list(payload.get("ignorePatterns"));
        if !ignore.is_empty() {
            source.ignore_patterns = PatternSet::compile(&ignore);
        }

        source.headers = coerce_string_map(payload.get("headers"));
        source.metadata = coerce_object(payload.get("metadata"));
        source.min_delay_hours = to_float(payload.get("minDelayHours"));
        source.content_mode = ContentMode::parse(
            clean_string(first_present(payload, &["mode", "contentMode"])).as_deref(),
        );
        source.source_label = clean_string(payload.get("sourceLabel"));
        source.carrier_status_code = clean_string(payload.get("carrierStatusCode"));

        Ok(source)
    }

    /// Global headers overlaid with this source's headers, names lowercased.
    pub fn request_headers(&self, settings: &EngineSettings) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        merge_headers(&mut headers, &settings.global_headers);
        merge_headers(&mut headers, &self.headers);
        headers
    }

    /// Threshold for this source: its own override, else the engine default.
    pub fn effective_min_delay_hours(&self, settings: &EngineSettings) -> f64 {
        self.min_delay_hours.unwrap_or(settings.min_delay_hours)
    }

    pub fn label<'a>(&'a self, settings: &'a EngineSettings) -> &'a str {
        self.source_label.as_deref().unwrap_or(&settings.source_label)
    }

    pub fn status_code<'a>(&'a self, settings: &'a EngineSettings) -> &'a str {
        self.carrier_status_code
            .as_deref()
            .unwrap_or(&settings.carrier_status_code)
    }
}

/// Parse every source in the run input.
///
/// Invalid entries are skipped with a warning. An undecodable `sources`
/// payload counts as no sources. When `sources` yields nothing but a
/// top-level `url` exists, a single source is synthesized from top-level keys.
pub fn parse_sources(payload: &Map<String, Value>, settings: &EngineSettings) -> Vec<SourceConfig> {
    let mut entries = crate::utils::coerce::coerce_sources(payload.get("sources"))
        .unwrap_or_else(|e| {
            log::error!("Invalid sources payload: {}", e);
            Vec::new()
        });

    if entries.is_empty() {
        if let Some(url) = clean_string(payload.get("url")) {
            let mut legacy = Map::new();
            legacy.insert("url".into(), Value::String(url));
            legacy.insert(
                "orderId".into(),
                Value::String(
                    clean_string(payload.get("orderId"))
                        .unwrap_or_else(|| "unknown-order".to_string()),
                ),
            );
            for key in ["promisedDeliveryDate", "delayPatterns"] {
                if let Some(value) = payload.get(key) {
                    legacy.insert(key.into(), value.clone());
                }
            }
            entries.push(Value::Object(legacy));
        }
    }

    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| match SourceConfig::from_value(entry, settings) {
            Ok(source) => Some(source),
            Err(e) => {
                log::warn!("Skipping source #{}: {}", idx, e);
                None
            }
        })
        .collect()
}

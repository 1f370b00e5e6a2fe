// src/services/builder.rs

//! Incident record assembly.

use chrono::{DateTime, Utc};

use crate::models::{
    EngineSettings, Incident, PatternMatch, SourceConfig, derive_incident_id, round_hours,
};
use crate::services::extractor::Extraction;
use crate::utils::datetime::to_iso;

/// Description used when neither a status text nor a matched text exists.
pub const GENERIC_STATUS_DESCRIPTION: &str = "Carrier reported delay.";

/// Everything the evaluator learned about a qualifying source.
#[derive(Debug, Clone)]
pub struct Findings {
    pub extraction: Extraction,
    pub matched: PatternMatch,
    pub snippet: Option<String>,
    pub promised: Option<DateTime<Utc>>,
    pub estimated: Option<DateTime<Utc>>,
    pub delay_hours: f64,
}

/// The source's declared incident id, or one derived from order id and URL.
pub fn incident_id(source: &SourceConfig, settings: &EngineSettings) -> String {
    source.incident_id.clone().unwrap_or_else(|| {
        derive_incident_id(&settings.incident_prefix, &source.order_id, &source.url)
    })
}

/// Assemble the sparse output record.
pub fn build_incident(
    source: &SourceConfig,
    settings: &EngineSettings,
    findings: Findings,
    detected_at: DateTime<Utc>,
) -> Incident {
    let Findings {
        extraction,
        matched,
        snippet,
        promised,
        estimated,
        delay_hours,
    } = findings;

    let description = extraction
        .status_text
        .clone()
        .or_else(|| Some(matched.text.clone()).filter(|t| !t.trim().is_empty()))
        .unwrap_or_else(|| GENERIC_STATUS_DESCRIPTION.to_string());

    let metadata = if source.metadata.is_empty() {
        None
    } else {
        Some(source.metadata.clone())
    };

    Incident {
        incident_id: incident_id(source, settings),
        order_id: source.order_id.clone(),
        delay_hours: round_hours(delay_hours),
        promised_delivery_date: promised
            .as_ref()
            .map(to_iso)
            .or_else(|| extraction.promised_raw.clone()),
        estimated_delivery: estimated
            .as_ref()
            .map(to_iso)
            .or_else(|| extraction.estimated_raw.clone()),
        carrier_status_code: source.status_code(settings).to_string(),
        carrier_status_description: description,
        detected_at: to_iso(&detected_at),
        source: source.label(settings).to_string(),
        carrier: source.carrier.clone(),
        region: source.region.clone(),
        raw_status_text: extraction.status_text,
        raw_estimated_delivery: extraction.estimated_raw,
        raw_promised_delivery: extraction.promised_raw,
        raw_snapshot: snippet,
        matched_pattern: Some(matched.pattern),
        matched_text: Some(matched.text),
        metadata,
    }
    .into_sparse()
}

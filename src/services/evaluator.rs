// src/services/evaluator.rs

//! Per-source pipeline.
//!
//! Each source moves linearly through
//! `Fetching → ContentDetected → Extracted → IgnoreChecked → PatternMatched
//! → ThresholdChecked → Built`, leaving early as `Discarded` when an ignore
//! pattern matches, no delay pattern matches, or the delay is below the
//! threshold. Fetch failures surface as errors.

use std::fmt;

use chrono::Utc;

use crate::error::Result;
use crate::models::{EngineSettings, Incident, MatchOrigin, SourceConfig};
use crate::services::builder::{Findings, build_incident};
use crate::services::delay::determine_delay_hours;
use crate::services::extractor::{extract, is_json_mode};
use crate::services::fetcher::{DocumentFetcher, FetchedDocument};
use crate::services::matcher::{context_snippet, find_delay, find_ignore};
use crate::utils::datetime::parse_datetime;

/// Pipeline stage of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    ContentDetected,
    Extracted,
    IgnoreChecked,
    PatternMatched,
    ThresholdChecked,
    Built,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::ContentDetected => "content-detected",
            Stage::Extracted => "extracted",
            Stage::IgnoreChecked => "ignore-checked",
            Stage::PatternMatched => "pattern-matched",
            Stage::ThresholdChecked => "threshold-checked",
            Stage::Built => "built",
        };
        f.write_str(name)
    }
}

/// Why a source produced no incident.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscardReason {
    IgnoreMatched { pattern: String },
    NoDelayMatch,
    BelowThreshold { delay_hours: f64, threshold: f64 },
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::IgnoreMatched { pattern } => {
                write!(f, "ignore pattern matched ({pattern})")
            }
            DiscardReason::NoDelayMatch => f.write_str("no delay pattern matched"),
            DiscardReason::BelowThreshold {
                delay_hours,
                threshold,
            } => write!(
                f,
                "detected delay ({delay_hours:.1}h) below threshold ({threshold}h)"
            ),
        }
    }
}

/// Terminal state of a source that was fetched successfully.
#[derive(Debug, Clone)]
pub enum Evaluation {
    Built(Box<Incident>),
    Discarded(DiscardReason),
}

impl Evaluation {
    pub fn into_incident(self) -> Option<Incident> {
        match self {
            Evaluation::Built(incident) => Some(*incident),
            Evaluation::Discarded(_) => None,
        }
    }
}

/// Runs the pipeline for one source at a time.
pub struct SourceEvaluator<'a> {
    settings: &'a EngineSettings,
}

impl<'a> SourceEvaluator<'a> {
    pub fn new(settings: &'a EngineSettings) -> Self {
        Self { settings }
    }

    /// Fetch the source and evaluate the document.
    pub async fn evaluate(
        &self,
        fetcher: &dyn DocumentFetcher,
        source: &SourceConfig,
    ) -> Result<Evaluation> {
        self.enter(source, Stage::Fetching);
        let headers = source.request_headers(self.settings);
        let document = fetcher.fetch(&source.url, &headers).await?;
        Ok(self.evaluate_document(source, &document))
    }

    /// Evaluate an already fetched document. Pure CPU work.
    pub fn evaluate_document(&self, source: &SourceConfig, document: &FetchedDocument) -> Evaluation {
        let json = is_json_mode(&document.content_type, source.content_mode);
        self.enter(source, Stage::ContentDetected);
        log::debug!(
            "{}: {} mode (content-type '{}', declared {})",
            source.order_id,
            if json { "json" } else { "html" },
            document.content_type,
            source.content_mode
        );

        let extraction = extract(&document.body, &document.content_type, source);
        self.enter(source, Stage::Extracted);

        let status_text = extraction.status_text.as_deref();
        if let Some(pattern) =
            find_ignore(&source.ignore_patterns, status_text, &extraction.page_text)
        {
            log::info!("{}: ignore pattern matched; skipping.", source.order_id);
            return Evaluation::Discarded(DiscardReason::IgnoreMatched {
                pattern: pattern.as_str().to_string(),
            });
        }
        self.enter(source, Stage::IgnoreChecked);

        let Some(matched) = find_delay(&source.delay_patterns, status_text, &extraction.page_text)
        else {
            log::info!("{}: no delay pattern matched.", source.order_id);
            return Evaluation::Discarded(DiscardReason::NoDelayMatch);
        };
        self.enter(source, Stage::PatternMatched);

        let snippet_source = match matched.origin {
            MatchOrigin::Status => status_text.unwrap_or_default(),
            MatchOrigin::Body => extraction.page_text.as_str(),
        };
        let snippet = context_snippet(snippet_source, &matched, self.settings.snapshot_chars);

        let estimated = extraction
            .estimated_raw
            .as_deref()
            .or(snippet.as_deref())
            .and_then(parse_datetime);
        let promised = extraction.promised_raw.as_deref().and_then(parse_datetime);

        let (delay_hours, delay_source) = determine_delay_hours(
            source.expected_delay_hours,
            promised,
            estimated,
            self.settings.default_delay_hours,
        );
        let threshold = source.effective_min_delay_hours(self.settings);
        log::debug!(
            "{}: {:.2}h delay from {:?} input (threshold {}h)",
            source.order_id,
            delay_hours,
            delay_source,
            threshold
        );
        if delay_hours < threshold {
            let reason = DiscardReason::BelowThreshold {
                delay_hours,
                threshold,
            };
            log::info!("{}: {}.", source.order_id, reason);
            return Evaluation::Discarded(reason);
        }
        self.enter(source, Stage::ThresholdChecked);

        let findings = Findings {
            extraction,
            matched,
            snippet,
            promised,
            estimated,
            delay_hours,
        };
        let incident = build_incident(source, self.settings, findings, Utc::now());
        self.enter(source, Stage::Built);
        Evaluation::Built(Box::new(incident))
    }

    fn enter(&self, source: &SourceConfig, stage: Stage) {
        log::debug!("{}: {}", source.order_id, stage);
    }
}

// src/services/coordinator.rs

//! Bounded-concurrency batch evaluation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt, stream};

use crate::error::{AppError, Result};
use crate::models::{EngineSettings, Incident, SourceConfig};
use crate::services::evaluator::{DiscardReason, Evaluation, SourceEvaluator};
use crate::services::fetcher::DocumentFetcher;

/// Result of scanning one batch of sources.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Incidents in completion order
    pub incidents: Vec<Incident>,
    pub source_total: usize,
    pub discarded: Vec<(String, DiscardReason)>,
    pub failures: usize,
}

/// Evaluates sources concurrently with at most `settings.concurrency`
/// in flight. A failing or panicking source never affects the others.
pub struct ScanCoordinator {
    settings: Arc<EngineSettings>,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl ScanCoordinator {
    pub fn new(settings: Arc<EngineSettings>, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self { settings, fetcher }
    }

    pub async fn run(&self, sources: &[SourceConfig]) -> ScanOutcome {
        let concurrency = self.settings.concurrency.max(1);
        let mut outcome = ScanOutcome {
            source_total: sources.len(),
            ..ScanOutcome::default()
        };

        let mut results = stream::iter(sources)
            .map(|source| async move {
                let result = AssertUnwindSafe(self.evaluate(source))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(panic_error(panic.as_ref())));
                (source, result)
            })
            .buffer_unordered(concurrency);

        while let Some((source, result)) = results.next().await {
            match result {
                Ok(Evaluation::Built(incident)) => outcome.incidents.push(*incident),
                Ok(Evaluation::Discarded(reason)) => {
                    outcome.discarded.push((source.order_id.clone(), reason))
                }
                Err(e) => {
                    outcome.failures += 1;
                    log::error!("{}: failed to evaluate {}: {}", source.order_id, source.url, e);
                }
            }
        }

        outcome
    }

    async fn evaluate(&self, source: &SourceConfig) -> Result<Evaluation> {
        SourceEvaluator::new(&self.settings)
            .evaluate(self.fetcher.as_ref(), source)
            .await
    }
}

fn panic_error(panic: &(dyn std::any::Any + Send)) -> AppError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    AppError::source("evaluation panicked", message)
}

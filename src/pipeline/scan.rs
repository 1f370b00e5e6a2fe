// src/pipeline/scan.rs

//! One engine run.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::host::ScanHost;
use crate::models::{Config, EngineSettings, parse_sources};
use crate::services::{DocumentFetcher, HttpFetcher, ScanCoordinator, ScanOutcome};

/// Scan all sources of `payload` over HTTP.
pub async fn run_scan(config: &Config, payload: &Map<String, Value>) -> Result<ScanOutcome> {
    let settings = EngineSettings::resolve(&config.engine, payload);
    let fetcher = HttpFetcher::new(&config.http, settings.request_timeout)?;
    run_scan_with(settings, Arc::new(fetcher), payload).await
}

/// Scan all sources of `payload` with resolved settings and a given fetcher.
pub async fn run_scan_with(
    settings: EngineSettings,
    fetcher: Arc<dyn DocumentFetcher>,
    payload: &Map<String, Value>,
) -> Result<ScanOutcome> {
    let start_time = Utc::now();
    let sources = parse_sources(payload, &settings);
    if sources.is_empty() {
        return Err(AppError::config(
            "no sources configured; provide `sources` or a top-level `url`",
        ));
    }

    log::info!(
        "Scanning {} source(s) with concurrency {}",
        sources.len(),
        settings.concurrency
    );

    let coordinator = ScanCoordinator::new(Arc::new(settings), fetcher);
    let outcome = coordinator.run(&sources).await;

    let elapsed = Utc::now() - start_time;
    log::info!(
        "Scan finished in {:.1}s: {} incident(s), {} discarded, {} failed of {} source(s)",
        elapsed.num_milliseconds() as f64 / 1000.0,
        outcome.incidents.len(),
        outcome.discarded.len(),
        outcome.failures,
        outcome.source_total
    );
    for (order_id, reason) in &outcome.discarded {
        log::debug!("{}: discarded, {}", order_id, reason);
    }

    Ok(outcome)
}

/// Drive one run through `host`: input, scan, push.
pub async fn run_with_host(host: &dyn ScanHost, config: &Config) -> Result<ScanOutcome> {
    let payload = host.get_input().await?;
    let outcome = run_scan(config, &payload).await?;
    push_outcome(host, &outcome).await?;
    Ok(outcome)
}

pub(crate) async fn push_outcome(host: &dyn ScanHost, outcome: &ScanOutcome) -> Result<()> {
    if outcome.incidents.is_empty() {
        log::info!("No delay incidents detected.");
    } else {
        log::info!("Detected {} delay incident(s).", outcome.incidents.len());
    }
    host.push_data(&outcome.incidents).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::models::Incident;
    use crate::services::FetchedDocument;

    struct FixedFetcher(&'static str);

    #[async_trait]
    impl DocumentFetcher for FixedFetcher {
        async fn fetch(&self, url: &str, _: &BTreeMap<String, String>) -> Result<FetchedDocument> {
            Ok(FetchedDocument {
                url: url.to_string(),
                status: 200,
                content_type: "text/html".into(),
                body: self.0.into(),
            })
        }
    }

    #[derive(Default)]
    struct MemoryHost {
        pushed: Mutex<Option<Vec<Incident>>>,
    }

    #[async_trait]
    impl ScanHost for MemoryHost {
        async fn get_input(&self) -> Result<Map<String, Value>> {
            Ok(Map::new())
        }

        async fn push_data(&self, incidents: &[Incident]) -> Result<()> {
            *self.pushed.lock().unwrap() = Some(incidents.to_vec());
            Ok(())
        }
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_no_sources_is_fatal() {
        let err = run_scan_with(
            EngineSettings::default(),
            Arc::new(FixedFetcher("")),
            &Map::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_legacy_single_source() {
        let input = payload(json!({"url": "https://t.example/1"}));
        let outcome = run_scan_with(
            EngineSettings::default(),
            Arc::new(FixedFetcher("<p>Weather exception at hub</p>")),
            &input,
        )
        .await
        .unwrap();
        assert_eq!(outcome.incidents.len(), 1);
        assert_eq!(outcome.incidents[0].order_id, "unknown-order");
        assert_eq!(outcome.incidents[0].delay_hours, 48.0);
    }

    #[tokio::test]
    async fn test_zero_incidents_pushes_empty_list() {
        let host = MemoryHost::default();
        let outcome = ScanOutcome {
            source_total: 2,
            ..ScanOutcome::default()
        };
        push_outcome(&host, &outcome).await.unwrap();
        let pushed = host.pushed.lock().unwrap().clone();
        assert_eq!(pushed.map(|incidents| incidents.len()), Some(0));
    }
}

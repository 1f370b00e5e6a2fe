// src/services/fetcher.rs

//! Document fetching.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;
use crate::utils::http::{build_header_map, create_async_client};

/// A successfully fetched document.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    /// Lowercased `Content-Type` header, empty when missing
    pub content_type: String,
    pub body: String,
}

/// Source of documents for the evaluator.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// GET `url` with `headers`. Non-2xx responses are errors.
    async fn fetch(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<FetchedDocument>;
}

/// Fetcher backed by one shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config, timeout)?,
            timeout,
        })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<FetchedDocument> {
        let target = Url::parse(url)?;
        let response = self
            .client
            .get(target)
            .headers(build_header_map(headers))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let body = response.text().await?;

        Ok(FetchedDocument {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

// src/utils/http.rs

//! HTTP client utilities.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;

use crate::error::Result;
use crate::models::HttpConfig;

/// Create the shared, connection-pooled asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig, timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(timeout)
        .redirect(Policy::limited(config.max_redirects))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build()?;
    Ok(client)
}

/// Overlay `headers` onto `target`. Header names compare case-insensitively,
/// so keys are stored lowercased and later values win.
pub fn merge_headers<'a>(
    target: &mut BTreeMap<String, String>,
    headers: impl IntoIterator<Item = (&'a String, &'a String)>,
) {
    for (name, value) in headers {
        target.insert(name.trim().to_ascii_lowercase(), value.clone());
    }
}

/// Convert a string map into request headers, skipping invalid entries.
pub fn build_header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let parsed = (
            HeaderName::from_bytes(name.trim().as_bytes()),
            HeaderValue::from_str(value.trim()),
        );
        match parsed {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => log::warn!("Skipping invalid request header '{}'", name),
        }
    }
    map
}

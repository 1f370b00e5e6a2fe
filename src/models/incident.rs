//! Delay incident record emitted to the host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use md5::{Digest, Md5};

/// A detected carrier delay for an order.
///
/// The schema is sparse: absent values are omitted from the serialized
/// record rather than written as `null` or `""`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub incident_id: String,
    pub order_id: String,
    /// Rounded to two decimals
    pub delay_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promised_delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
    pub carrier_status_code: String,
    pub carrier_status_description: String,
    pub detected_at: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_estimated_delivery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_promised_delivery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_snapshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Incident {
    /// Drop empty optional values so they are omitted on output.
    pub fn into_sparse(mut self) -> Self {
        for field in [
            &mut self.promised_delivery_date,
            &mut self.estimated_delivery,
            &mut self.carrier,
            &mut self.region,
            &mut self.raw_status_text,
            &mut self.raw_estimated_delivery,
            &mut self.raw_promised_delivery,
            &mut self.raw_snapshot,
            &mut self.matched_pattern,
            &mut self.matched_text,
        ] {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
        if self.metadata.as_ref().is_some_and(Map::is_empty) {
            self.metadata = None;
        }
        self
    }
}

/// Deterministic incident identifier: `{PREFIX}-{ORDER}-{HASH}`, uppercased,
/// where `HASH` is the first 8 hex digits of MD5 over `order_id:url`.
pub fn derive_incident_id(prefix: &str, order_id: &str, url: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(order_id.as_bytes());
    hasher.update(b":");
    hasher.update(url.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}-{}", prefix, order_id, &digest[..8]).to_uppercase()
}

/// Round to two decimal places.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

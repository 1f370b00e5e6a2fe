//! Filesystem-backed host for local runs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::host::ScanHost;
use crate::models::Incident;

/// Reads the payload from a JSON file and writes incidents to a file or stdout.
#[derive(Debug, Clone)]
pub struct LocalHost {
    input: PathBuf,
    output: Option<PathBuf>,
}

impl LocalHost {
    pub fn new(input: impl Into<PathBuf>, output: Option<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output,
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl ScanHost for LocalHost {
    async fn get_input(&self) -> Result<Map<String, Value>> {
        let bytes = tokio::fs::read(&self.input).await?;
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::validation(format!(
                "input {} must be a JSON object, got {}",
                self.input.display(),
                type_name(&other)
            ))),
        }
    }

    async fn push_data(&self, incidents: &[Incident]) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(incidents)?;
        bytes.push(b'\n');
        match &self.output {
            Some(path) => {
                Self::write_bytes(path, &bytes).await?;
                log::info!("Wrote {} incident(s) to {}", incidents.len(), path.display());
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&bytes).await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn incident(order: &str) -> Incident {
        Incident {
            incident_id: format!("DELAY-{order}-ABCD1234"),
            order_id: order.into(),
            delay_hours: 48.0,
            promised_delivery_date: None,
            estimated_delivery: None,
            carrier_status_code: "IN_TRANSIT_DELAYED".into(),
            carrier_status_description: "Delayed".into(),
            detected_at: "2024-02-08T10:00:00Z".into(),
            source: "delay-scan#carrier-delay-scan".into(),
            carrier: None,
            region: None,
            raw_status_text: None,
            raw_estimated_delivery: None,
            raw_promised_delivery: None,
            raw_snapshot: None,
            matched_pattern: None,
            matched_text: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_reads_object_payload() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.json");
        std::fs::write(&input, r#"{"sources": [], "minDelayHours": 12}"#).unwrap();

        let host = LocalHost::new(&input, None);
        let payload = host.get_input().await.unwrap();
        assert_eq!(payload.get("minDelayHours"), Some(&serde_json::json!(12)));
    }

    #[tokio::test]
    async fn test_rejects_non_object_payload() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.json");
        std::fs::write(&input, "[1, 2]").unwrap();

        let err = LocalHost::new(&input, None).get_input().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = LocalHost::new(dir.path().join("nope.json"), None)
            .get_input()
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[tokio::test]
    async fn test_push_writes_atomically() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out").join("incidents.json");
        let host = LocalHost::new(dir.path().join("input.json"), Some(output.clone()));

        host.push_data(&[incident("ORD-1"), incident("ORD-2")]).await.unwrap();
        let written: Vec<Value> =
            serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0]["orderId"], "ORD-1");
        assert!(written[0].get("carrier").is_none());
        assert!(!output.with_extension("tmp").exists());

        host.push_data(&[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap().trim(), "[]");
    }
}

//! Host boundary for engine runs.
//!
//! The engine reads exactly one input payload per run and pushes exactly one
//! dataset (the incident list) back to the host.

pub mod local;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::Incident;

pub use local::LocalHost;

/// Trait for run hosts.
#[async_trait]
pub trait ScanHost: Send + Sync {
    /// The run's input payload (sources plus global overrides).
    async fn get_input(&self) -> Result<Map<String, Value>>;

    /// Publish the incidents of this run. Called once, possibly with an empty list.
    async fn push_data(&self, incidents: &[Incident]) -> Result<()>;
}

// src/models/mod.rs

//! Domain models for the scanner.
//!
//! Configuration, resolved settings, per-source configuration, compiled
//! patterns and the emitted incident record.

mod config;
mod incident;
mod pattern;
mod settings;
mod source;

// Re-export all public types
pub use config::{Config, EngineConfig, HttpConfig};
pub use incident::{Incident, derive_incident_id, round_hours};
pub use pattern::{MatchOrigin, Pattern, PatternKind, PatternMatch, PatternSet};
pub use settings::{EngineSettings, MAX_CONCURRENCY};
pub use source::{ContentMode, FieldLocators, SourceConfig, parse_sources};

//! Service layer for the delay scanner.
//!
//! This module contains the business logic for:
//! - Document fetching (`DocumentFetcher`, `HttpFetcher`)
//! - Candidate extraction from HTML/JSON (`extractor`)
//! - Ignore/delay pattern decisions and snippets (`matcher`)
//! - Delay computation (`delay`) and incident assembly (`builder`)
//! - Per-source evaluation (`SourceEvaluator`)
//! - Bounded-concurrency batches (`ScanCoordinator`)

pub mod builder;
mod coordinator;
pub mod delay;
mod evaluator;
pub mod extractor;
mod fetcher;
pub mod matcher;

pub use coordinator::{ScanCoordinator, ScanOutcome};
pub use evaluator::{DiscardReason, Evaluation, SourceEvaluator, Stage};
pub use fetcher::{DocumentFetcher, FetchedDocument, HttpFetcher};

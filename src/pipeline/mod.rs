//! Pipeline entry points for scan runs.
//!
//! - `run_scan`: Evaluate every source of one input payload
//! - `run_with_host`: Read input from a host, scan, push incidents back

pub mod scan;

pub use scan::{run_scan, run_scan_with, run_with_host};

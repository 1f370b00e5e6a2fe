// src/lib.rs

//! delay-scan: carrier delay incident extraction and decision engine

pub mod error;
pub mod host;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

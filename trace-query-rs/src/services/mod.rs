//! Typed clients for the remote APIs the pipeline depends on
//!
//! - `jaeger`: trace-metadata API (services and their operations)
//! - `ollama`: local text-generation endpoint

pub mod jaeger;
pub mod ollama;
mod common;

pub use common::UserAgent;

// Public fallible APIs in this crate share one concrete error contract (`ConsultError`).
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod ingest;
pub(crate) mod llm_io;
pub mod models;
pub mod pipeline;
pub mod research;
pub(crate) mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use error::{ConsultError, ErrorPayload, Result};
pub use pipeline::{PipelineCommand, PipelineController, SessionState, Stage};

#![deny(missing_docs)]

//! Core library for the Rusty Doc summarization pipeline.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Collaborator handles shared by the pipeline.
pub mod context;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline metrics helpers.
pub mod metrics;
/// Document processing pipeline.
pub mod processing;
/// External collaborator contracts and HTTP adapters.
pub mod services;

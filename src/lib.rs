#![deny(missing_docs)]

//! Core library for the Folioscan document processing service.

/// HTTP routing and REST handlers.
pub mod api;
/// Object-store boundary for page and source artifacts.
pub mod assets;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline counters and snapshots.
pub mod metrics;
/// Persistent record types shared across the pipeline.
pub mod model;
/// Structural index generation and outline tree building.
pub mod outline;
/// Document processing pipeline: split, per-page recognition, progress.
pub mod pipeline;
/// Recognition service client abstraction and HTTP adapter.
pub mod recognition;
/// Hybrid semantic + lexical search engine.
pub mod search;
/// Source artifact page splitting.
pub mod split;
/// Document store boundary and in-memory implementation.
pub mod store;

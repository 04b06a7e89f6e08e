//! OB Platform client library
//!
//! Queries the ASHRAE occupant behavior (OB) database API and downloads data
//! exports: ZIP archives of per-study, per-behavior CSV files.
//!
//! # Architecture
//!
//! - [`connector`] - HTTP connector: behavior listings, health check, exports
//! - [`config`] - Endpoint, timeout and export polling settings

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod connector;
mod user_agent;

// Re-export commonly used types
pub use config::{ConnectorConfig, DEFAULT_ENDPOINT};
pub use connector::{
    Behavior, BehaviorId, Connector, ConnectorError, DEFAULT_CHUNK_SIZE, ExportOptions,
    ExportSummary, HealthStatus, ProgressCallback, SelectionKind, StudyBehaviors, StudyId,
};

//! Bulk loader for FHIR JSON files.
//!
//! Scans a directory for `*.json` documents (typically Synthea transaction
//! Bundles), submits practitioner and hospital files first, then everything
//! else, one POST at a time, and reports per-file and aggregate results.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod loader;
pub mod observability;
pub mod output;

pub use client::{FhirClient, SubmitResponse};
pub use config::LoaderConfig;
pub use error::LoadError;
pub use loader::{LoadOutcome, LoadSummary, Loader};

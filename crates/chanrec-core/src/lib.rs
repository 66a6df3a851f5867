//! Core resolution and reconciliation logic, free of any database or I/O
//! concerns beyond reading the mappings file.
//!
//! The pipeline: normalize option text ([`normalize`]), extract candidate
//! codes ([`extract`]), resolve line items against a mapping snapshot
//! ([`resolve`], [`snapshot`]), plan and apply idempotent stock deltas
//! ([`ledger`]), recompute daily aggregates ([`aggregate`]), and summarize
//! the run for operators ([`report`]).

use thiserror::Error;

pub mod aggregate;
pub mod app_config;
pub mod config;
pub mod extract;
pub mod ledger;
pub mod mappings_file;
pub mod model;
pub mod normalize;
pub mod report;
pub mod resolve;
pub mod snapshot;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use mappings_file::MappingsFile;
pub use model::{
    idempotency_key, Attribution, CanonicalProduct, DailyAggregate, IdentifierMapping,
    OrderLineItem, Platform, RejectReason, RejectedItem, ResolutionMethod, ResolutionResult,
    SourceType, StockDelta,
};
pub use report::ResolutionReport;
pub use resolve::{resolve_batch, resolve_line_item, BatchResolution};
pub use snapshot::{LookupOutcome, MappingConflict, MappingSnapshot};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("unknown source type: {0}")]
    UnknownSourceType(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read mappings file {path}: {reason}")]
    MappingsFileIo { path: String, reason: String },
    #[error("failed to parse mappings file {path}: {reason}")]
    MappingsFileParse { path: String, reason: String },
    #[error("invalid mappings file: {0}")]
    Validation(String),
}

//! Error types and handling for the print-order quoting core

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Custom result type for quoting operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for quoting operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while analyzing an uploaded document.
///
/// Page-level failures never surface here: a page whose inspection fails is
/// degraded to the conservative default (not color, not foldout) and analysis
/// continues. Only document-level failures are reported, and callers are
/// expected to fall back to `AnalysisResult::unknown` rather than block the
/// order.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error("document cannot be parsed: {0}")]
    UnparsableDocument(String),

    #[error("file size {size} exceeds the {limit} byte maximum")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("page {page} inspection failed: {reason}")]
    PageAnalysis { page: u32, reason: String },

    #[error("page {page} could not be rasterized: {reason}")]
    Render { page: u32, reason: String },

    #[error("no rasterizer available for pixel sampling")]
    RasterizerUnavailable,

    #[error("analysis queue closed: {0}")]
    QueueClosed(String),
}

/// Errors raised by configuration and order validation
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid pricing tiers: {0}")]
    InvalidTiers(String),

    #[error("invalid rate: {0}")]
    InvalidRate(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}

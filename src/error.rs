//! Error types for csvreo.
//!
//! Every failure is fatal to the run. [`ReoError::category`] groups the
//! variants into the small closed set a caller maps to exit codes.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A configuration that must be rejected before any input is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0:?} is not a valid delimiter")]
    InvalidDelimiter(char),

    #[error("{0:?} is not a valid quote")]
    InvalidQuote(char),

    #[error("{0:?} used as quote and delimiter")]
    DelimiterEqualsQuote(char),

    #[error("no keys specified for output {output}")]
    NoKeys { output: usize },

    #[error("no outputs configured")]
    NoOutputs,

    #[error("key value {0} is out of range (keys start at 1)")]
    KeyOutOfRange(i64),

    #[error("buffer size must be greater than zero")]
    ZeroBufferSize,
}

/// Errors raised while running the reorder pipeline.
#[derive(Debug, Error)]
pub enum ReoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV parse error on line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("memory allocation failed: {0}")]
    ResourceExhausted(#[from] TryReserveError),

    #[error("failed to start parser thread: {0}")]
    Thread(#[source] io::Error),

    #[error("file {} failed to open: {source}", path.display())]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse grouping of [`ReoError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Config,
    Resource,
    Sink,
    Io,
}

impl ReoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReoError::Config(_) => ErrorCategory::Config,
            ReoError::Parse { .. } => ErrorCategory::Parse,
            ReoError::ResourceExhausted(_) | ReoError::Thread(_) => ErrorCategory::Resource,
            ReoError::SinkUnavailable { .. } => ErrorCategory::Sink,
            ReoError::Io(_) => ErrorCategory::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReoError>;

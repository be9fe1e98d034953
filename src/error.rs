//! Error taxonomy for the analysis pipeline core.
//!
//! Errors never flow through a result stream: a stage's failure degrades to
//! early end-of-stream, and a provider's per-target failure is recorded on
//! its exception stream instead. This module only gives those two surfaces a
//! concrete, matchable shape instead of bare `anyhow::Error`.

use thiserror::Error;

/// Fatal errors that abort a run before any stage has started.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("missing configuration key: {0}")]
    MissingConfig(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("stage type '{0}' is not registered")]
    UnknownStageType(String),

    #[error("output directory '{path}' is not usable: {source}")]
    OutputDirUnusable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// An extractor failure for a single target. Recorded on a provider's
/// exception stream; never terminates the run.
#[derive(Debug, Error, Clone)]
pub enum ExtractorError {
    #[error("extraction of '{target}' timed out after {timeout_ms}ms")]
    Timeout { target: String, timeout_ms: u64 },

    #[error("extraction of '{target}' failed: {message}")]
    Failed { target: String, message: String },
}

/// A cache entry was missing structure. Logged at WARNING and treated as a
/// miss by the provider that reads it.
#[derive(Debug, Error, Clone)]
pub enum FormatError {
    #[error("cache entry for '{0}' is corrupted: {1}")]
    CorruptedCache(String, String),
}

/// An uncaught failure inside a stage's work function. The stage closes its
/// output early; downstream stages observe an early end-of-stream.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {message}")]
pub struct StageError {
    pub stage: String,
    pub message: String,
}

/// Failure writing a result artifact. The run continues; the artifact may be
/// truncated.
#[derive(Debug, Error)]
#[error("I/O error writing '{path}': {source}")]
pub struct IoError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// Top-level error returned by fatal, run-aborting operations (pipeline
/// assembly, configuration loading). Non-fatal errors (extractor failures,
/// stage panics) are never represented by this type — they're recorded on
/// exception streams or logged.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

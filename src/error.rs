//! @acp:module "Errors"
//! @acp:summary "Error types for configuration, ordering and I/O failures"
//! @acp:domain cli
//! @acp:layer model
//!
//! Two failure kinds matter to callers: [`ConfigError`] is raised before any
//! row is placed, [`Error::Pseudorandomization`] when the retry budget runs
//! out. Both abort the current file only; the batch driver keeps going.

use thiserror::Error;

/// Malformed constraints, tables or requests, detected before placement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max run for '{property}' must be a positive integer, got {value}")]
    InvalidMaxRun { property: String, value: String },

    #[error("constraint '{property}' defined twice with conflicting max runs ({first} and {second})")]
    ConflictingMaxRun {
        property: String,
        first: usize,
        second: usize,
    },

    #[error("line {line}: expected 'Constraint <property> <max_run>', got '{content}'")]
    MalformedConstraintLine { line: usize, content: String },

    #[error("requested {requested} rows but only {available} remain in the pool")]
    CountExceedsPool { requested: usize, available: usize },

    #[error("retry limit must be at least 1")]
    ZeroRetryLimit,

    #[error("at least one order must be requested")]
    ZeroOrders,

    #[error("item '{0}' appears more than once")]
    DuplicateItem(String),

    #[error("column '{0}' not found in table header")]
    MissingColumn(String),

    #[error("no row matches the anchor filters")]
    NoAnchorCandidate,

    #[error("invalid row filter '{0}'")]
    InvalidFilter(String),
}

/// Errors produced by the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no feasible ordering found within retry budget for {context} (gave up after {attempts} attempts)")]
    Pseudorandomization { context: String, attempts: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    /// True when the error is the retry budget running out.
    pub fn is_pseudorandomization(&self) -> bool {
        matches!(self, Error::Pseudorandomization { .. })
    }

    /// The configuration error, if this is one.
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Error::Config(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use std::path::PathBuf;

use thiserror::Error;

/// Error types for rule configuration.
///
/// Every variant is raised while a [`RuleTableStore`](crate::store::RuleTableStore)
/// is being built. Encoding itself never fails.
#[derive(Debug, Error)]
pub enum BmpmError {
    /// A rule whose pattern would consume nothing
    #[error("{variant}: empty pattern in {stage} table for '{language}' (rule #{index})")]
    EmptyPattern {
        variant: String,
        stage: String,
        language: String,
        index: usize,
    },
    /// A language filter, detection rule or table key naming no known language
    #[error("{variant}: unknown language '{name}'")]
    UnknownLanguage { variant: String, name: String },
    /// A context or detection regex that does not compile
    #[error("{variant}: invalid pattern '{pattern}': {source}")]
    InvalidContext {
        variant: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// A replacement string that is not a literal or a flat alternation
    #[error("{variant}: malformed replacement '{replacement}': {reason}")]
    MalformedReplacement {
        variant: String,
        replacement: String,
        reason: String,
    },
    /// A variant without the mandatory `any` table for a stage
    #[error("{variant}: missing 'any' table for the {stage} stage")]
    MissingTable { variant: String, stage: String },
    /// A variant name that is not gen, ash or sep
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),
    /// A store built without rule data for one of the three variants
    #[error("no rule data for variant '{0}'")]
    MissingVariant(String),
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON from '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for configuration loading
pub type BmpmResult<T> = Result<T, BmpmError>;

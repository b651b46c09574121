//! Error types for context resolution and planner-data persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while resolving or building a planning context.
///
/// Resolution failures leave the cache and the allocator untouched. The two
/// persistence variants are only ever logged: they describe a degraded
/// allocation, never a failed one.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("no planner configuration named '{name}'")]
    UnknownConfiguration { name: String },

    #[error("no representation factory of type '{space_type}'")]
    UnknownRepresentation { space_type: String },

    #[error("no representation factory can handle a request for group '{group}'")]
    NoSuitableRepresentation { group: String },

    #[error("unknown planner '{planner_id}'")]
    UnknownAlgorithm { planner_id: String },

    #[error("representation '{space_type}' could not be built for group '{group}': {reason}")]
    RepresentationBuildFailed {
        space_type: String,
        group: String,
        reason: String,
    },

    #[error("invalid value '{value}' for option '{option}'")]
    InvalidOptionValue { option: String, value: String },

    #[error("failed to load planner data for '{name}' from {path}: {source}")]
    PersistenceLoadFailed {
        name: String,
        path: PathBuf,
        #[source]
        source: PlannerDataError,
    },

    #[error("failed to store planner data for '{name}' to {path}: {source}")]
    PersistenceStoreFailed {
        name: String,
        path: PathBuf,
        #[source]
        source: PlannerDataError,
    },
}

impl ContextError {
    pub(crate) fn invalid_option(option: &str, value: &str) -> Self {
        ContextError::InvalidOptionValue {
            option: option.to_string(),
            value: value.to_string(),
        }
    }
}

/// Errors from reading or writing exploration-graph data.
#[derive(Error, Debug)]
pub enum PlannerDataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("planner data was produced by '{found}', expected '{expected}'")]
    FormatMismatch { expected: String, found: String },

    #[error("planner '{planner_type}' cannot be seeded with stored data")]
    Unsupported { planner_type: String },

    #[error("no planner data stored at {0}")]
    NotFound(PathBuf),
}

impl From<serde_json::Error> for PlannerDataError {
    fn from(e: serde_json::Error) -> Self {
        PlannerDataError::Serialization(e.to_string())
    }
}

/// Errors loading a [`ManagerConfig`](crate::config::ManagerConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate planner configuration '{0}'")]
    DuplicateConfiguration(String),
}

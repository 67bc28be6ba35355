//! Error types for grizzly.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing, reconciling or syncing resources.
#[derive(Error, Debug)]
pub enum GrizzlyError {
    #[error("UID must be <provider>.<uid>: {0}")]
    InvalidUid(String),

    #[error("Handler not found: {0}")]
    HandlerNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(PathBuf),

    /// The remote system has no object for this uid. Drives the Add path.
    #[error("Resource not found at remote: {kind}/{uid}")]
    NotFound { kind: String, uid: String },

    #[error("Resources without a UID: {}", .0.join(", "))]
    MissingUids(Vec<String>),

    #[error("Duplicate resource: {key}")]
    DuplicateResource { key: String },

    #[error("Error retrieving resource from {kind} {uid}: {message}")]
    Remote {
        kind: String,
        uid: String,
        message: String,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in '{path}': {message}")]
    ParseYaml { path: PathBuf, message: String },

    #[error("Failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Invalid manifest in '{path}': {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("Found invalid object (at {path}): {message}")]
    Extract { path: String, message: String },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("No evaluator configured for '{0}'")]
    EvaluatorMissing(PathBuf),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("File operation failed: {0}")]
    FileOperation(String),
}

impl From<serde_yaml::Error> for GrizzlyError {
    fn from(err: serde_yaml::Error) -> Self {
        GrizzlyError::ParseYaml {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for GrizzlyError {
    fn from(err: std::io::Error) -> Self {
        GrizzlyError::FileOperation(err.to_string())
    }
}

impl GrizzlyError {
    /// Builds the not-found error a handler returns when the remote has no such object.
    pub fn not_found(kind: impl Into<String>, uid: impl Into<String>) -> Self {
        GrizzlyError::NotFound {
            kind: kind.into(),
            uid: uid.into(),
        }
    }

    /// Returns true if the remote reported the object as absent.
    ///
    /// This is the only recoverable remote failure: it never reaches the caller
    /// of a one-shot operation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GrizzlyError::NotFound { .. })
    }

    /// Wraps a remote failure with the kind and uid it happened on.
    pub fn remote(kind: &str, uid: &str, err: &GrizzlyError) -> Self {
        GrizzlyError::Remote {
            kind: kind.to_string(),
            uid: uid.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for grizzly operations.
pub type Result<T> = std::result::Result<T, GrizzlyError>;

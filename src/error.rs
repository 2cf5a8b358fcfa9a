//! Error types for JSON:API document assembly, link resolution and validation.

use std::path::PathBuf;
use thiserror::Error;

/// A type used as a resource lacks required declarative metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{class} is not a JSON:API resource: no resource type declared")]
    MissingType { class: String },

    #[error("{class} declares no identifier: mark a string field or a zero-argument accessor as id")]
    MissingId { class: String },

    #[error("{class} yields an empty identifier from '{member}'")]
    EmptyId { class: String, member: String },

    #[error("{class}::{member} is renamed as an attribute but takes parameters or returns nothing")]
    UngettableAccessor { class: String, member: String },
}

/// Errors while turning domain objects into a document.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("relationship '{name}' of {class} cannot identify its target: {source}")]
    Relationship {
        class: String,
        name: String,
        #[source]
        source: ConfigurationError,
    },

    #[error("cannot encode document: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while resolving links against a base URI.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid base URI '{uri}': {source}")]
    InvalidBase {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot resolve link '{reference}': {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid link at {path}: expected string or link object, got {actual}")]
    InvalidLinkType { path: String, actual: String },
}

/// Errors raised by [`crate::Buildable::build`].
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Errors while loading a document from disk or text.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("a JSON:API document must be an object, got {actual}")]
    NotAnObject { actual: String },
}

/// Errors during document validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid document schema: {message}")]
    InvalidSchema { message: String },

    #[error("document invalid with {} error(s)", errors.len())]
    Invalid { errors: Vec<DocumentError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentError {
    /// JSON Pointer (RFC 6901) to the offending member.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl LinkError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } | LoadError::NotAnObject { .. } => 2,
        }
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

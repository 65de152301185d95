//! Error Types
//!
//! Two layers: `IoError` is what a Document I/O Port reports, `StacError` is the
//! taxonomy every core operation returns.

use crate::types::NodeType;
use thiserror::Error;

/// Failure surfaced by a Document I/O Port implementation.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("location not found: {location}")]
    NotFound { location: String },

    #[error("failed to read {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported location {location}: {reason}")]
    Unsupported { location: String, reason: String },
}

impl IoError {
    /// The location the failing call was made against.
    pub fn location(&self) -> &str {
        match self {
            IoError::NotFound { location }
            | IoError::Read { location, .. }
            | IoError::Write { location, .. }
            | IoError::Unsupported { location, .. } => location,
        }
    }
}

/// Errors raised by graph, resolution and serialization operations.
#[derive(Debug, Error)]
pub enum StacError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("format error: {0}")]
    Format(String),

    #[error("cannot resolve {target}: {reason}")]
    Resolution {
        target: String,
        reason: String,
        #[source]
        source: Option<Box<StacError>>,
    },

    #[error("adding {node} would create a cycle: it is an ancestor of {ancestor}")]
    Cycle { node: String, ancestor: String },

    #[error("{operation} expects {expected}, found {found}")]
    Type {
        operation: &'static str,
        expected: &'static str,
        found: NodeType,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("{object} is missing required property '{property}'")]
    RequiredPropertyMissing { object: String, property: String },

    #[error("extension {extension} is not declared on {object}")]
    ExtensionNotImplemented { extension: String, object: String },

    #[error("{0}")]
    ExtensionType(String),

    #[error("validation failed: {}", messages.join("; "))]
    Validation { messages: Vec<String> },

    #[error("configuration error: {0}")]
    Config(String),
}

impl StacError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        StacError::Format(message.into())
    }

    pub(crate) fn resolution(target: impl Into<String>, reason: impl Into<String>) -> Self {
        StacError::Resolution {
            target: target.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Wrap a lower-level failure raised while resolving `target`.
    pub(crate) fn resolution_from(target: impl Into<String>, source: StacError) -> Self {
        StacError::Resolution {
            target: target.into(),
            reason: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn missing(object: impl Into<String>, property: impl Into<String>) -> Self {
        StacError::RequiredPropertyMissing {
            object: object.into(),
            property: property.into(),
        }
    }

    /// True for `Resolution`, including hop-guard exhaustion.
    pub fn is_resolution(&self) -> bool {
        matches!(self, StacError::Resolution { .. })
    }
}

//! Schema Validation
//!
//! Validation is a capability handed to the graph, not something nodes know
//! how to do. A [`SchemaValidator`] receives a serialized document plus its
//! declared type and version and reports pass/fail with diagnostics; the
//! caller decides whether a failure rejects the operation or is collected.

mod schema;

pub use schema::JsonSchemaValidator;

use crate::error::StacError;
use crate::types::NodeType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub ok: bool,
    pub messages: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            ok: true,
            messages: Vec::new(),
        }
    }

    pub fn invalid(messages: Vec<String>) -> Self {
        Self { ok: false, messages }
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.ok &= other.ok;
        self.messages.extend(other.messages);
    }

    /// `Err(Validation)` when the document failed.
    pub fn into_result(self) -> Result<Self, StacError> {
        if self.ok {
            Ok(self)
        } else {
            Err(StacError::Validation {
                messages: self.messages,
            })
        }
    }
}

/// What a failed validation does to the calling operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Fail the operation.
    #[default]
    Reject,
    /// Return the diagnostics and carry on.
    Collect,
}

/// Checks a serialized document against the schemas for its type.
pub trait SchemaValidator {
    fn validate(
        &self,
        doc: &Value,
        node_type: NodeType,
        stac_version: &str,
    ) -> Result<ValidationResult, StacError>;
}

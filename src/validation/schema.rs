//! JSON Schema backed validator.

use super::{SchemaValidator, ValidationResult};
use crate::config::ValidationConfig;
use crate::error::StacError;
use crate::types::NodeType;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Validates documents against registered core and extension schemas.
///
/// Core schemas are keyed by node type and STAC version; extension schemas
/// by the URI listed in a document's `stac_extensions`.
#[derive(Default)]
pub struct JsonSchemaValidator {
    core: HashMap<(NodeType, String), JSONSchema>,
    extensions: HashMap<String, JSONSchema>,
}

fn compile(schema: &Value, label: &str) -> Result<JSONSchema, StacError> {
    JSONSchema::compile(schema)
        .map_err(|e| StacError::Config(format!("failed to compile schema {}: {}", label, e)))
}

fn read_schema(path: &Path) -> Result<Value, StacError> {
    let raw = std::fs::read(path)
        .map_err(|e| StacError::Config(format!("failed to read schema {}: {}", path.display(), e)))?;
    serde_json::from_slice(&raw)
        .map_err(|e| StacError::Config(format!("failed to parse schema {}: {}", path.display(), e)))
}

fn check(schema: &JSONSchema, doc: &Value, label: &str) -> ValidationResult {
    match schema.validate(doc) {
        Ok(()) => ValidationResult::valid(),
        Err(errors) => ValidationResult::invalid(
            errors
                .map(|err| {
                    let path = err.instance_path.to_string();
                    let path = if path.is_empty() { "/".to_string() } else { path };
                    format!("[{}] {}: {}", label, path, err)
                })
                .collect(),
        ),
    }
}

impl JsonSchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_core(
        &mut self,
        node_type: NodeType,
        stac_version: impl Into<String>,
        schema: &Value,
    ) -> Result<(), StacError> {
        let version = stac_version.into();
        let compiled = compile(schema, &format!("{} {}", node_type, version))?;
        self.core.insert((node_type, version), compiled);
        Ok(())
    }

    pub fn register_extension(&mut self, uri: impl Into<String>, schema: &Value) -> Result<(), StacError> {
        let uri = uri.into();
        let compiled = compile(schema, &uri)?;
        self.extensions.insert(uri, compiled);
        Ok(())
    }

    pub fn has_extension(&self, uri: &str) -> bool {
        self.extensions.contains_key(uri)
    }

    /// Load schemas from a directory laid out as
    /// `catalog.json`, `collection.json`, `item.json` and `extensions/*.json`.
    ///
    /// Core schemas are registered for `stac_version`. Extension schemas are
    /// keyed by their `$id`; files without one are skipped.
    pub fn from_dir(dir: &Path, stac_version: &str) -> Result<Self, StacError> {
        let mut validator = Self::new();
        for node_type in [NodeType::Catalog, NodeType::Collection, NodeType::Item] {
            let file = match node_type {
                NodeType::Catalog => "catalog.json",
                NodeType::Collection => "collection.json",
                NodeType::Item => "item.json",
            };
            let path = dir.join(file);
            if path.is_file() {
                validator.register_core(node_type, stac_version, &read_schema(&path)?)?;
                debug!(path = %path.display(), node_type = %node_type, "registered core schema");
            }
        }

        let ext_dir = dir.join("extensions");
        if ext_dir.is_dir() {
            let entries = std::fs::read_dir(&ext_dir).map_err(|e| {
                StacError::Config(format!("failed to read {}: {}", ext_dir.display(), e))
            })?;
            for entry in entries {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        warn!("failed to read entry in {}: {}", ext_dir.display(), e);
                        continue;
                    }
                };
                if path.extension() != Some(std::ffi::OsStr::new("json")) {
                    continue;
                }
                let schema = read_schema(&path)?;
                match schema.get("$id").and_then(Value::as_str) {
                    Some(uri) => {
                        validator.register_extension(uri.to_string(), &schema)?;
                        debug!(uri, "registered extension schema");
                    }
                    None => warn!(path = %path.display(), "extension schema has no $id; skipped"),
                }
            }
        }
        Ok(validator)
    }

    /// Validator for the configured schema directory.
    ///
    /// With no directory configured the validator is empty, so every
    /// validation reports a missing core schema.
    pub fn from_config(config: &ValidationConfig, stac_version: &str) -> Result<Self, StacError> {
        match &config.schema_dir {
            Some(dir) if dir.is_dir() => Self::from_dir(dir, stac_version),
            Some(dir) => Err(StacError::Config(format!(
                "schema directory {} does not exist",
                dir.display()
            ))),
            None => Ok(Self::new()),
        }
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(
        &self,
        doc: &Value,
        node_type: NodeType,
        stac_version: &str,
    ) -> Result<ValidationResult, StacError> {
        let core = self
            .core
            .get(&(node_type, stac_version.to_string()))
            .ok_or_else(|| {
                StacError::NotFound(format!("core schema for {} {}", node_type, stac_version))
            })?;
        let mut result = check(core, doc, &format!("{} {}", node_type, stac_version));

        let declared = doc
            .get("stac_extensions")
            .and_then(Value::as_array)
            .map(|uris| uris.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        for uri in declared {
            match self.extensions.get(uri) {
                Some(schema) => result.merge(check(schema, doc, uri)),
                None => warn!(extension = uri, "no schema registered for extension; skipped"),
            }
        }
        Ok(result)
    }
}

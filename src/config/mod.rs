//! Configuration
//!
//! Settings for logging, resolution and validation, composed from built-in
//! defaults, an optional file and `STAC_GRAPH__*` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::validation::ValidationMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hop guard used when no configuration is supplied.
pub const DEFAULT_MAX_HOPS: usize = 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StacConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Link resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Upper bound on parent/root hops for root walks and ancestor checks.
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
}

fn default_max_hops() -> usize {
    DEFAULT_MAX_HOPS
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
        }
    }
}

/// Schema validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub mode: ValidationMode,
    /// Directory holding core and extension schemas.
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
}

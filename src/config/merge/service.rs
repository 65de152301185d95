//! MergeService: orchestrates sources and deserializes to StacConfig.

use crate::config::sources::{environment, file};
use crate::config::StacConfig;
use config::ConfigError;
use std::path::Path;

use super::defaults;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> file -> environment (highest).
    pub fn load(path: Option<&Path>) -> Result<StacConfig, ConfigError> {
        let builder = defaults::builder_with_defaults()?;
        let builder = match path {
            Some(path) => file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        let loaded: StacConfig = config.try_deserialize()?;
        tracing::debug!(
            max_hops = loaded.resolution.max_hops,
            mode = ?loaded.validation.mode,
            "configuration loaded"
        );
        Ok(loaded)
    }
}

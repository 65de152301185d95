//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::StacConfig;
use crate::error::StacError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults overlaid with the environment.
    pub fn load() -> Result<StacConfig, StacError> {
        MergeService::load(None).map_err(config_error)
    }

    /// Defaults, then `path`, then the environment.
    pub fn load_from_file(path: &Path) -> Result<StacConfig, StacError> {
        MergeService::load(Some(path)).map_err(config_error)
    }

    pub fn default() -> StacConfig {
        StacConfig::default()
    }
}

fn config_error(err: config::ConfigError) -> StacError {
    StacError::Config(err.to_string())
}

//! Explicit configuration file source. Format follows the file extension.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    Ok(builder.add_source(File::from(path).required(true)))
}

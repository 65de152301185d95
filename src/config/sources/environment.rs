//! Environment variable source: STAC_GRAPH__ prefix with __ separator.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

/// Prefix for configuration keys, e.g. `STAC_GRAPH__RESOLUTION__MAX_HOPS`.
pub const ENV_PREFIX: &str = "STAC_GRAPH";

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}

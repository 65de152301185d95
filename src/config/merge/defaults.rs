//! Built-in defaults, the lowest-precedence layer.

use crate::config::DEFAULT_MAX_HOPS;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("resolution.max_hops", DEFAULT_MAX_HOPS as i64)?
        .set_default("validation.mode", "reject")
}

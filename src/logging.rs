//! Logging System
//!
//! Structured logging through `tracing`. The library itself only emits
//! events; `init_logging` installs a subscriber for applications and tests
//! that want to see them.

use crate::error::StacError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const LOG_ENV: &str = "STAC_GRAPH_LOG";
pub const LOG_FORMAT_ENV: &str = "STAC_GRAPH_LOG_FORMAT";
pub const LOG_OUTPUT_ENV: &str = "STAC_GRAPH_LOG_OUTPUT";
pub const LOG_FILE_ENV: &str = "STAC_GRAPH_LOG_FILE";
pub const LOG_MODULES_ENV: &str = "STAC_GRAPH_LOG_MODULES";

/// Resolve the log file path: `STAC_GRAPH_LOG_FILE`, then the configured
/// path, then the platform state directory.
pub fn resolve_log_file_path(config_file: Option<PathBuf>) -> Result<PathBuf, StacError> {
    if let Ok(env_path) = std::env::var(LOG_FILE_ENV) {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    default_log_file_path()
}

fn default_log_file_path() -> Result<PathBuf, StacError> {
    let project_dirs = directories::ProjectDirs::from("", "stac-graph", "stac-graph")
        .ok_or_else(|| {
            StacError::Config("could not determine platform directories for log file".to_string())
        })?;
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_local_dir());
    Ok(dir.join("stac-graph.log"))
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored output (text format on terminals only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `stac_graph::graph = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

/// Install the global subscriber.
///
/// Environment variables win over `config`. Fails if a global subscriber is
/// already set.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), StacError> {
    if config.map(|c| !c.enabled).unwrap_or(false) {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(|e| StacError::Config(format!("failed to install subscriber: {}", e)));
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true) && !output.file;
    let writer = build_writer(&output, config.and_then(|c| c.file.clone()))?;

    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);
    let registry = Registry::default().with(filter);
    let installed = if format == "json" {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer.with_ansi(use_color)).try_init()
    };
    installed.map_err(|e| StacError::Config(format!("failed to install subscriber: {}", e)))
}

fn open_log_file(config_file: Option<PathBuf>) -> Result<std::fs::File, StacError> {
    let log_file = resolve_log_file_path(config_file)?;
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StacError::Config(format!("failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| StacError::Config(format!("failed to open log file {:?}: {}", log_file, e)))
}

fn build_writer(
    output: &OutputDestinations,
    config_file: Option<PathBuf>,
) -> Result<BoxMakeWriter, StacError> {
    let writer = if output.file {
        let file = Arc::new(open_log_file(config_file)?);
        if output.stderr {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        }
    } else if output.stdout && output.stderr {
        BoxMakeWriter::new(std::io::stdout.and(std::io::stderr))
    } else if output.stdout {
        BoxMakeWriter::new(std::io::stdout)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };
    Ok(writer)
}

/// Filter from `STAC_GRAPH_LOG`, else from config plus module directives.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, StacError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut directives: Vec<String> = Vec::new();
    if let Some(config) = config {
        directives.extend(
            config
                .modules
                .iter()
                .map(|(module, module_level)| format!("{}={}", module, module_level)),
        );
    }
    if let Ok(modules) = std::env::var(LOG_MODULES_ENV) {
        directives.extend(parse_module_directives(&modules));
    }

    let mut filter = EnvFilter::new(level);
    for directive in directives {
        filter = filter.add_directive(directive.parse().map_err(|e| {
            StacError::Config(format!("invalid log directive '{}': {}", directive, e))
        })?);
    }
    Ok(filter)
}

/// `a=debug, b=trace` into directives; malformed entries are ignored.
fn parse_module_directives(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|directive| {
            let (module, level) = directive.split_once('=')?;
            let (module, level) = (module.trim(), level.trim());
            if module.is_empty() || level.is_empty() {
                None
            } else {
                Some(format!("{}={}", module, level))
            }
        })
        .collect()
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<String, StacError> {
    if let Ok(format) = std::env::var(LOG_FORMAT_ENV) {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }

    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(StacError::Config(format!(
            "invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format.to_string())
}

#[derive(Debug, PartialEq, Eq)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<OutputDestinations, StacError> {
    if let Ok(output) = std::env::var(LOG_OUTPUT_ENV) {
        return parse_output_destinations(&output);
    }
    let output = config.map(|c| c.output.as_str()).unwrap_or("stderr");
    parse_output_destinations(output)
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, StacError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        _ => {
            return Err(StacError::Config(format!(
                "invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                output
            )))
        }
    };
    Ok(OutputDestinations {
        stdout,
        stderr,
        file,
    })
}

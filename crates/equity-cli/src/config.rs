use equity_client::EndpointConfig;
use equity_core::game::request::{MAX_CONCURRENCY, MAX_ITERATIONS, SimulationParams};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_LOG_FILE: &str = "equity.jsonl";

/// Root client configuration loaded from YAML. Every block is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub simulation: SimulationParams,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: ClientConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_endpoint(&self.endpoint)?;
        validate_simulation(&self.simulation)?;
        self.logging.normalize();
        if self.logging.level().is_none() {
            return Err(ValidationError::InvalidField {
                field: "logging.tracing_level".to_string(),
                message: format!("unknown level '{}'", self.logging.tracing_level),
            });
        }
        Ok(())
    }
}

fn validate_endpoint(endpoint: &EndpointConfig) -> Result<(), ValidationError> {
    let base = endpoint.base_url.trim();
    if base.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "endpoint.base_url".to_string(),
            message: "base URL must not be empty".to_string(),
        });
    }
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ValidationError::InvalidField {
            field: "endpoint.base_url".to_string(),
            message: "base URL must start with http:// or https://".to_string(),
        });
    }
    if endpoint.simulation_path.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "endpoint.simulation_path".to_string(),
            message: "simulation path must not be empty".to_string(),
        });
    }
    if endpoint.timeout_ms == 0 {
        return Err(ValidationError::InvalidField {
            field: "endpoint.timeout_ms".to_string(),
            message: "timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn validate_simulation(simulation: &SimulationParams) -> Result<(), ValidationError> {
    if !(1..=MAX_ITERATIONS).contains(&simulation.iterations) {
        return Err(ValidationError::InvalidField {
            field: "simulation.iterations".to_string(),
            message: format!("iterations must be between 1 and {MAX_ITERATIONS}"),
        });
    }
    if !(1..=MAX_CONCURRENCY).contains(&simulation.concurrency) {
        return Err(ValidationError::InvalidField {
            field: "simulation.concurrency".to_string(),
            message: format!("concurrency must be between 1 and {MAX_CONCURRENCY}"),
        });
    }
    Ok(())
}

/// Logging configuration defaults to human-readable output on stderr.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            file: default_log_file(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
        if self.file.as_os_str().is_empty() {
            self.file = default_log_file();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

//! Server configuration.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard-server/config.toml`)
//! 4. Compiled defaults

use std::path::{Path, PathBuf};

use crate::state::DEFAULT_MAX_LINE_LENGTH;

/// Default listen address. The board has always lived on port 8080.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A value parsed but cannot be used.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Top-level TOML file. Every field is optional so files can be partial.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerSection,
}

/// `[server]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_addr: Option<String>,
    max_line_length: Option<usize>,
}

/// CLI arguments for the server binary.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Collaborative task board server")]
pub struct ServerCliArgs {
    /// Address to listen on.
    #[arg(short, long, env = "TASKBOARD_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/taskboard-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Longest accepted protocol line in bytes.
    #[arg(long)]
    pub max_line_length: Option<usize>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_LOG")]
    pub log_level: String,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// Longest accepted protocol line in bytes.
    pub max_line_length: usize,
    /// Log filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration by merging CLI args, env vars and a TOML file.
    ///
    /// An explicit `--config` path must exist. Without one, the default
    /// path is tried and a missing file counts as empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if
    /// a resolved value is unusable.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &ServerCliArgs, file: &ServerConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            max_line_length: cli
                .max_line_length
                .or(file.server.max_line_length)
                .unwrap_or(defaults.max_line_length),
            log_level: cli.log_level.clone(),
        };

        if config.max_line_length == 0 {
            return Err(ConfigError::Invalid {
                field: "max_line_length",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(config)
    }
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<ServerConfigFile, ConfigError> {
    if let Some(path) = explicit_path {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ServerConfigFile::default());
    };
    let path = config_dir.join("taskboard-server").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfigFile::default()),
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}

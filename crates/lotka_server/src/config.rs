use config::{Config, Environment, File};
use lotka_core::dashboard::DashboardOptions;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Looked up as `lotka.toml` in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lotka";
pub const DEFAULT_PORT: u16 = 8050;
pub const ENV_PREFIX: &str = "LOTKA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid PORT value '{0}': expected an integer between 0 and 65535")]
    InvalidPort(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub log: LogConfig,
    /// Time grid, solver and figure layers used for every plot.
    pub dashboard: DashboardOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            log: LogConfig::default(),
            dashboard: DashboardOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// JSON lines instead of the compact human format.
    pub json: bool,
    /// Used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: "lotka_server=info,lotka_core=info,tower_http=info".to_string(),
        }
    }
}

/// Layers an optional config file and `LOTKA__*` environment overrides
/// (e.g. `LOTKA__LOG__JSON=true` maps to `log.json`).
///
/// The file is only required when `path` is given explicitly.
pub fn load_config_from(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let (effective_path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let config = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<ServerConfig>()?;

    Ok(config)
}

/// [`load_config_from`] plus the platform `PORT` variable (Heroku and
/// similar hosts assign the listening port through it).
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let mut config = load_config_from(path)?;
    apply_platform_port(&mut config, std::env::var("PORT").ok().as_deref())?;
    Ok(config)
}

pub fn apply_platform_port(config: &mut ServerConfig, port: Option<&str>) -> Result<(), ConfigError> {
    if let Some(raw) = port {
        config.port = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(raw.to_string()))?;
    }
    Ok(())
}

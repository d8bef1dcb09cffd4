//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or broken config file never prevents startup; the problem is
//! reported through [`DashboardConfig::config_warning`] and defaults apply.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::engine::filter::SpeciesMatch;
use crate::localize::Language;
use crate::{Error, Result};

pub const ENV_ENDPOINT_URL: &str = "PFFP_ENDPOINT_URL";
pub const ENV_BIND_ADDR: &str = "PFFP_BIND";
pub const ENV_EXPORT_DIR: &str = "PFFP_EXPORT_DIR";
pub const ENV_CONFIG_PATH: &str = "PFFP_CONFIG";

/// Compiled defaults used when nothing else provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub bind_addr: String,
    pub language: Language,
    pub species_match: SpeciesMatch,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            bind_addr: "127.0.0.1:5740".to_string(),
            language: Language::Vi,
            species_match: SpeciesMatch::Token,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

/// `[logging]` table of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// On-disk TOML configuration; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub endpoint_url: Option<String>,
    pub bind_addr: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub language: Option<Language>,
    pub species_match: Option<SpeciesMatch>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint_url: Option<String>,
    pub bind_addr: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub language: Option<Language>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Data endpoint; `None` leaves the store empty until configured
    pub endpoint_url: Option<String>,
    pub bind_addr: String,
    /// Export destination; `None` means the export sink is unavailable
    pub export_dir: Option<PathBuf>,
    pub language: Language,
    pub species_match: SpeciesMatch,
    pub request_timeout: Duration,
    pub log_level: String,
    /// Config file that was read, if any
    pub config_file: Option<PathBuf>,
    /// Why the config file was skipped, if it was
    pub config_warning: Option<String>,
}

/// Per-user config file location (`<config_dir>/pffp/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pffp").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)?;
    Ok(config)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolves [`DashboardConfig`] from overrides, environment, file and defaults
pub struct ConfigResolver {
    overrides: Overrides,
    defaults: CompiledDefaults,
}

impl ConfigResolver {
    pub fn new(overrides: Overrides) -> Self {
        Self {
            overrides,
            defaults: CompiledDefaults::for_current_platform(),
        }
    }

    /// Locate the config file: explicit path, then `PFFP_CONFIG`, then the
    /// per-user default (only if it exists)
    fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.overrides.config_path {
            return Some(path.clone());
        }
        if let Some(path) = env_value(ENV_CONFIG_PATH) {
            return Some(PathBuf::from(path));
        }
        default_config_path().filter(|p| p.exists())
    }

    fn load_file(&self) -> (TomlConfig, Option<PathBuf>, Option<String>) {
        let Some(path) = self.config_path() else {
            return (TomlConfig::default(), None, None);
        };

        match load_toml_config(&path) {
            Ok(config) => {
                debug!("Loaded config file {}", path.display());
                (config, Some(path), None)
            }
            Err(e) => {
                let warning = match e {
                    Error::Io(io) => format!("Config file {} not readable: {}", path.display(), io),
                    other => format!("Config file {} ignored: {}", path.display(), other),
                };
                (TomlConfig::default(), None, Some(warning))
            }
        }
    }

    pub fn resolve(&self) -> DashboardConfig {
        let (file, config_file, config_warning) = self.load_file();
        let o = &self.overrides;
        let d = &self.defaults;

        let endpoint_url = o
            .endpoint_url
            .clone()
            .or_else(|| env_value(ENV_ENDPOINT_URL))
            .or(file.endpoint_url);

        let bind_addr = o
            .bind_addr
            .clone()
            .or_else(|| env_value(ENV_BIND_ADDR))
            .or(file.bind_addr)
            .unwrap_or_else(|| d.bind_addr.clone());

        let export_dir = o
            .export_dir
            .clone()
            .or_else(|| env_value(ENV_EXPORT_DIR).map(PathBuf::from))
            .or(file.export_dir);

        DashboardConfig {
            endpoint_url,
            bind_addr,
            export_dir,
            language: o.language.or(file.language).unwrap_or(d.language),
            species_match: file.species_match.unwrap_or(d.species_match),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs.unwrap_or(d.request_timeout_secs),
            ),
            log_level: file.logging.level.unwrap_or_else(|| d.log_level.clone()),
            config_file,
            config_warning,
        }
    }
}

use crate::domain::errors::ValidationError;
use crate::domain::geo::{Distance, DistanceUnit};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub search: SearchSettings,
    pub schedule: ScheduleSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogSettings {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchSettings {
    pub default_radius: f64,
    pub unit: DistanceUnit,
    pub max_radius: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleSettings {
    pub transition_horizon_days: i64,
    pub upcoming_horizon_days: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Self::builder(&environment)?
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("PULSE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load settings from one explicit file on top of the defaults, ignoring
    /// the environment
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("catalog.path", "data/catalog.json")?
            .set_default("search.default_radius", 5.0)?
            .set_default("search.unit", "miles")?
            .set_default("search.max_radius", 100.0)?
            .set_default("schedule.transition_horizon_days", 8)?
            .set_default("schedule.upcoming_horizon_days", 60)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Self::defaults()?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false)))
    }

    /// The configured default search radius
    pub fn default_radius(&self) -> Result<Distance, ValidationError> {
        Distance::try_new(self.search.default_radius, self.search.unit)
    }

    /// The largest radius a search may ask for
    pub fn max_radius(&self) -> Result<Distance, ValidationError> {
        Distance::try_new(self.search.max_radius, self.search.unit)
    }
}

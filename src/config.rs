use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_EXPIRING_SOON_DAYS: i64 = 7;
const CONFIG_DIR: &str = "config";

/// Application configuration with validation.
///
/// Sources are layered: defaults, then an optional
/// `config/{environment}.toml`, then `APP__*` environment variables
/// (e.g. `APP__DATABASE_URL`). `DATABASE_URL` is honored as a fallback
/// for the most common deployment setup.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,

    /// Environment name: development, test or production
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Window, in days, for the "expiring soon" band
    #[serde(default = "default_expiring_soon_days")]
    #[validate(range(min = 1))]
    pub expiring_soon_days: i64,

    /// Run migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_min_connections() -> u32 {
    DEFAULT_MIN_CONNECTIONS
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_expiring_soon_days() -> i64 {
    DEFAULT_EXPIRING_SOON_DAYS
}

impl AppConfig {
    /// Minimal constructor used by tests and embedded setups.
    pub fn new(database_url: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            db_min_connections: DEFAULT_MIN_CONNECTIONS,
            environment: environment.into(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            expiring_soon_days: DEFAULT_EXPIRING_SOON_DAYS,
            auto_migrate: false,
        }
    }

    /// Loads configuration from files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let run_env = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let mut builder = Config::builder()
            .set_default("environment", run_env.clone())?
            .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        // Conventional fallback outside the APP__ namespace.
        if let Ok(url) = env::var("DATABASE_URL") {
            builder = builder.set_override_option("database_url", Some(url))?;
        }

        let cfg: AppConfig = builder.build()?.try_deserialize()?;
        cfg.validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

        if cfg.database_url.is_empty() {
            return Err(ConfigError::Message(
                "database_url must be set (APP__DATABASE_URL or DATABASE_URL)".to_string(),
            ));
        }

        Ok(cfg)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_test(&self) -> bool {
        self.environment == "test"
    }
}

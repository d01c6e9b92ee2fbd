pub mod auth_config;
pub mod chat_config;
pub mod database_config;
pub mod defaults;
pub mod security_config;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;

pub use auth_config::AuthConfig;
pub use chat_config::ChatConfig;
pub use database_config::DatabaseConfig;
pub use security_config::SecurityConfig;

const PLACEHOLDER_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Auth configuration is invalid: {0}")]
    Auth(String),

    #[error("Chat configuration is invalid: {0}")]
    Chat(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "defaults::default_host")]
    pub host: String,
    #[serde(default = "defaults::default_port")]
    pub port: u16,
    #[serde(default = "defaults::default_environment")]
    pub environment: String,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "defaults::default_logging_level")]
    pub level: String,
    #[serde(default = "defaults::default_logging_json_format")]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::default_logging_level(),
            json_format: defaults::default_logging_json_format(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Box<figment::Error>> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Toml::file("config/development.toml"))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::prefixed("DATABASE_").split("__").map(|key| {
                format!("database.{}", key.as_str()).into()
            }))
            .merge(Env::prefixed("AUTH_").split("__").map(|key| {
                format!("auth.{}", key.as_str()).into()
            }))
            .merge(Env::prefixed("SECURITY_").split("__").map(|key| {
                format!("security.{}", key.as_str()).into()
            }))
            .merge(Env::prefixed("LOGGING_").split("__").map(|key| {
                format!("logging.{}", key.as_str()).into()
            }))
            .merge(Env::prefixed("CHAT_").split("__").map(|key| {
                format!("chat.{}", key.as_str()).into()
            }))
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL", "JWT_SECRET"])
                    .map(|key| match key.as_str() {
                        "DATABASE_URL" => "database.url".into(),
                        "JWT_SECRET" => "auth.jwt_secret".into(),
                        _ => key.into(),
                    }),
            )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, Box<figment::Error>> {
        let mut config: Self = figment.extract().map_err(Box::new)?;

        config.security.metrics_admin_token =
            defaults::normalize_optional_string(config.security.metrics_admin_token);
        if config.auth.session_cookie_name.trim().is_empty() {
            config.auth.session_cookie_name = defaults::default_session_cookie_name();
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let jwt_secret = self.auth.jwt_secret.trim();
        if jwt_secret.is_empty() {
            return Err(ConfigError::Auth(
                "JWT_SECRET must be set via environment variable".to_string(),
            ));
        }

        if jwt_secret == PLACEHOLDER_JWT_SECRET {
            return Err(ConfigError::Auth(
                "JWT_SECRET must be set to a secure value, not the default placeholder".to_string(),
            ));
        }

        if self.auth.previous_jwt_kids.len() != self.auth.previous_jwt_secrets.len() {
            return Err(ConfigError::Auth(
                "previous_jwt_kids and previous_jwt_secrets must have the same length".to_string(),
            ));
        }

        if self.chat.persistence_timeout_ms == 0 {
            return Err(ConfigError::Chat(
                "persistence_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.chat.event_bus_capacity == 0 {
            return Err(ConfigError::Chat(
                "event_bus_capacity must be greater than 0".to_string(),
            ));
        }

        if self.chat.max_page_size <= 0 {
            return Err(ConfigError::Chat(
                "max_page_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

use crate::crypto::password::PasswordScheme;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "IotStats.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub api: ApiConfig,
    pub admin: AdminConfig,
    pub firmware: FirmwareConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Lifetime of a session in hours; every authenticated request slides it forward.
    pub expiration_hours: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    /// Shared secret devices send in the `Api-Key` header.
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    pub login: String,
    pub password: String,
    pub password_scheme: PasswordScheme,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FirmwareConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/iot_stats".to_string(),
            max_connections: 16,
            min_connections: 1,
            acquire_timeout: 5,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_hours: 24,
            cookie_secure: true,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            login: "admin".to_string(),
            password: String::new(),
            password_scheme: PasswordScheme::default(),
        }
    }
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self { path: "build".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. IotStats.toml, or the file named by IOT_STATS_CONFIG
    /// 3. Environment variables prefixed with IOT_STATS_ (`__` separates sections,
    ///    e.g. IOT_STATS_API__KEY)
    /// 4. DATABASE_URL
    pub fn load() -> Result<Self, figment::Error> {
        let file = std::env::var("IOT_STATS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::figment(&file).extract()
    }

    pub fn figment(file: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("IOT_STATS_").ignore(&["CONFIG"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
    }
}

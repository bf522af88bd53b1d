//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Deployment environment variables: `MONGODB_URI`, `PORT`
//! 2. Prefixed environment variables: `BOOKSTORE_<SECTION>__<KEY>`
//! 3. Current working directory: ./config.toml
//! 4. Default values
//!
//! Before the layers are read, `./.env` is exported into the process
//! environment, so its variables count as environment variables. Variables
//! already set in the environment win over the file.
//!
//! Configuration is read once at startup.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Prefix for service environment variables
pub const ENV_PREFIX: &str = "BOOKSTORE_";

/// Environment file read by [`Config::load`]
pub const DOTENV_FILE: &str = ".env";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Document store configuration
    pub database: DatabaseConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Book collection policy
    #[serde(default)]
    pub books: BooksConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string. `mongodb://` and `mongodb+srv://` select MongoDB,
    /// `mem://` selects the in-process store.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Database name
    #[serde(default = "default_database_name")]
    pub database: String,

    /// Collection holding the books
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Timeout for the initial connection and server selection in seconds
    #[serde(default = "default_connection_timeout")]
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Get the connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Whether the URL selects the in-process store
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("mem://")
    }
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Maximum request body size in kilobytes
    #[serde(default = "default_body_limit_kb")]
    pub body_limit_kb: usize,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_kb: default_body_limit_kb(),
        }
    }
}

impl MiddlewareConfig {
    /// Body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_kb * 1024
    }
}

/// How required fields are checked on create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredFieldPolicy {
    /// `null`, `false`, `0`, `""` and `[]` count as missing
    #[default]
    Truthy,
    /// Only absent or `null` fields count as missing
    Present,
}

/// Book collection policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksConfig {
    /// Documents per page on the list endpoint
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Required-field check applied on create
    #[serde(default)]
    pub required_field_policy: RequiredFieldPolicy,

    /// Fields a partial update may set
    #[serde(default = "default_mutable_fields")]
    pub mutable_fields: Vec<String>,
}

impl Default for BooksConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            required_field_policy: RequiredFieldPolicy::default(),
            mutable_fields: default_mutable_fields(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_database_url() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database_name() -> String {
    "bookstore".to_string()
}

fn default_collection() -> String {
    "books".to_string()
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_body_limit_kb() -> usize {
    100
}

fn default_page_size() -> u64 {
    crate::books::DEFAULT_PAGE_SIZE
}

fn default_mutable_fields() -> Vec<String> {
    crate::books::REQUIRED_FIELDS
        .iter()
        .map(|f| f.to_string())
        .collect()
}

impl Config {
    /// Load configuration from `./.env`, `./config.toml` and the environment
    pub fn load() -> Result<Self> {
        load_dotenv(DOTENV_FILE)?;
        Self::load_from("config.toml")
    }

    /// Load configuration using a specific TOML file
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::figment(path.as_ref()).extract()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&["MONGODB_URI"])
                    .map(|_| "database.url".into()),
            )
            .merge(Env::raw().only(&["PORT"]).map(|_| "service.port".into()))
    }
}

/// Export the variables of an env file into the process environment.
///
/// Variables that are already set keep their values. Returns `false` when the
/// file does not exist; a file that cannot be parsed is an error.
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<bool> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "bookstore".to_string(),
                port: default_port(),
                log_level: default_log_level(),
                environment: default_environment(),
            },
            database: DatabaseConfig {
                url: default_database_url(),
                database: default_database_name(),
                collection: default_collection(),
                connect_timeout_secs: default_connection_timeout(),
            },
            middleware: MiddlewareConfig::default(),
            books: BooksConfig::default(),
        }
    }
}

//! Service configuration
//!
//! Values come from built-in defaults, then `config/default.toml`, then the
//! file named by `SANCHAR_CONFIG`, then `SANCHAR__*` environment variables
//! (for example `SANCHAR__SERVER__PORT=9000`).

use std::env;

use common::RegistryLimits;
use config::{
    Config, ConfigError, Environment, File, FileFormat, builder::ConfigBuilder,
    builder::DefaultState,
};
use serde::Deserialize;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub smtp: SmtpConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Externally visible origin, used for links in key emails
    pub public_base_url: Option<String>,
    /// Upper bound on an upload request body, in bytes
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Share registry settings
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Six-field cron expression for the expiry sweep
    pub sweep_schedule: String,
    pub max_entries: usize,
    pub max_bundle_bytes: usize,
}

impl RegistryConfig {
    pub fn limits(&self) -> RegistryLimits {
        RegistryLimits {
            max_entries: self.max_entries,
            max_bundle_bytes: self.max_bundle_bytes,
        }
    }
}

/// Outbound email settings. Email is disabled when `host` is unset.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub tls: bool,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl AppConfig {
    /// Load configuration from files and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = defaults()?.add_source(File::with_name("config/default").required(false));

        if let Ok(path) = env::var("SANCHAR_CONFIG") {
            builder = builder.add_source(File::with_name(&path));
        }

        builder
            .add_source(
                Environment::with_prefix("SANCHAR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a TOML document layered over the defaults
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let limits = RegistryLimits::default();

    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000_i64)?
        .set_default("server.static_dir", "static")?
        .set_default("server.max_upload_bytes", 100_i64 * 1024 * 1024)?
        .set_default("registry.sweep_schedule", "0 * * * * *")?
        .set_default("registry.max_entries", limits.max_entries as i64)?
        .set_default("registry.max_bundle_bytes", limits.max_bundle_bytes as i64)?
        .set_default("smtp.port", 587_i64)?
        .set_default("smtp.from_address", "noreply@localhost")?
        .set_default("smtp.tls", true)?
        .set_default("logging.level", "info")
}

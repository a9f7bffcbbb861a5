//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `HRCTL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `HRCTL_` override YAML values
//! 3. **Conventional variables** - `DATABASE_URL`, `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`,
//!    `DB_PASS`, `JWT_SECRET`, `APP_URL`, `SMTP_HOST`, `SMTP_PORT`, `SMTP_USER`, `SMTP_PASS`
//!
//! The binary loads a `.env` file from the working directory before any of this happens, so
//! the conventional variables can live there.
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `HRCTL_AUTH__JWT_EXPIRY=2h` sets the `auth.jwt_expiry` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use hrctl::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "HRCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Public base URL of the application, used for links in emails and share URLs
    pub app_url: String,
    /// Full connection string, usually supplied through `DATABASE_URL`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Database connection parts and pool settings
    pub database: DatabaseConfig,
    /// Email address for the initial System Admin user (created on first startup)
    pub admin_email: String,
    /// Password for the initial admin user
    pub admin_password: Option<String>,
    /// Secret key for JWT signing and document share links (required)
    pub secret_key: Option<String>,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub documents: DocumentsConfig,
    /// Expose Prometheus metrics on `/internal/metrics`
    pub enable_metrics: bool,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// PostgreSQL connection settings.
///
/// `url` wins when present; otherwise the connection string is assembled from the parts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub pool: PoolSettings,
}

/// Connection pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Lifetime of issued session tokens
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    /// Cookie checked for a session token when no bearer header is sent
    pub session_cookie_name: String,
    pub password: PasswordConfig,
    pub two_factor: TwoFactorConfig,
    /// How long password reset tokens are valid
    #[serde(with = "humantime_serde")]
    pub password_reset_token_duration: Duration,
    pub cors: CorsConfig,
}

/// Password validation rules
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

/// Email-delivered second factor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwoFactorConfig {
    /// How long an emailed code stays valid
    #[serde(with = "humantime_serde")]
    pub code_ttl: Duration,
    /// Wrong guesses allowed before the challenge is burned
    pub max_attempts: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<u64>,
}

/// Outgoing email. Messages go to SMTP when `smtp` is set, otherwise to `.eml` files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmailConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpConfig>,
    /// Directory for the file transport
    pub file_path: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_tls: bool,
}

/// Employee document storage
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Root directory; each employee gets an `employee_<id>` subdirectory
    pub storage_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Lifetime of share links when the caller does not ask for one
    #[serde(with = "humantime_serde")]
    pub share_link_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub max_share_link_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            app_url: "http://localhost:3001".to_string(),
            database_url: None,
            database: DatabaseConfig::default(),
            admin_email: "admin@hospital.local".to_string(),
            admin_password: None,
            secret_key: None,
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            documents: DocumentsConfig::default(),
            enable_metrics: false,
            log_format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: "hrctl".to_string(),
            user: "postgres".to_string(),
            password: None,
            pool: PoolSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(24 * 60 * 60),
            session_cookie_name: "hrctl_session".to_string(),
            password: PasswordConfig::default(),
            two_factor: TwoFactorConfig::default(),
            password_reset_token_duration: Duration::from_secs(30 * 60),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
        }
    }
}

impl Default for TwoFactorConfig {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(10 * 60),
            max_attempts: 5,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp: None,
            file_path: "./emails".to_string(),
            from_email: "noreply@hospital.local".to_string(),
            from_name: "Hospital HR".to_string(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            use_tls: true,
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./storage/documents"),
            max_upload_bytes: 10 * 1024 * 1024,
            share_link_ttl: Duration::from_secs(60 * 60),
            max_share_link_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

impl DatabaseConfig {
    /// Connection string for the pool, assembled from parts when no url is given
    pub fn connection_url(&self) -> Result<String, Error> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let invalid = |what: &str| Error::Internal {
            operation: format!("build database url: invalid {what}"),
        };

        let mut url = Url::parse("postgres://localhost").map_err(|_| invalid("base url"))?;
        url.set_host(Some(&self.host)).map_err(|_| invalid("host"))?;
        url.set_port(Some(self.port)).map_err(|_| invalid("port"))?;
        url.set_username(&self.user).map_err(|_| invalid("user"))?;
        url.set_password(self.password.as_deref()).map_err(|_| invalid("password"))?;
        url.set_path(&self.name);
        Ok(url.to_string())
    }
}

/// Map one conventional environment variable onto a config key path
fn conventional_env(name: &'static str, key_path: &'static str) -> Env {
    Env::raw().only(&[name]).map(move |_| key_path.into())
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URL takes precedence over the individual connection parts
        if let Some(url) = config.database_url.take() {
            config.database.url = Some(url);
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        match self.secret_key.as_deref() {
            None | Some("") => {
                return Err(Error::Internal {
                    operation: "Config validation: secret_key is not configured. \
                     Set JWT_SECRET or HRCTL_SECRET_KEY, or add secret_key to the config file."
                        .to_string(),
                });
            }
            Some(_) => {}
        }

        if self.auth.password.min_length > self.auth.password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                    self.auth.password.min_length, self.auth.password.max_length
                ),
            });
        }

        if self.auth.two_factor.max_attempts < 1 {
            return Err(Error::Internal {
                operation: "Config validation: auth.two_factor.max_attempts must be at least 1".to_string(),
            });
        }

        if self.documents.max_upload_bytes == 0 {
            return Err(Error::Internal {
                operation: "Config validation: documents.max_upload_bytes must be greater than 0".to_string(),
            });
        }

        if self.documents.share_link_ttl > self.documents.max_share_link_ttl {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: documents.share_link_ttl ({:?}) cannot exceed documents.max_share_link_ttl ({:?})",
                    self.documents.share_link_ttl, self.documents.max_share_link_ttl
                ),
            });
        }

        Url::parse(&self.app_url).map_err(|e| Error::Internal {
            operation: format!("Config validation: app_url is not a valid URL: {e}"),
        })?;

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("HRCTL_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
            .merge(conventional_env("DB_HOST", "database.host"))
            .merge(conventional_env("DB_PORT", "database.port"))
            .merge(conventional_env("DB_NAME", "database.name"))
            .merge(conventional_env("DB_USER", "database.user"))
            .merge(conventional_env("DB_PASS", "database.password"))
            .merge(conventional_env("JWT_SECRET", "secret_key"))
            .merge(conventional_env("APP_URL", "app_url"))
            .merge(conventional_env("SMTP_HOST", "email.smtp.host"))
            .merge(conventional_env("SMTP_PORT", "email.smtp.port"))
            .merge(conventional_env("SMTP_USER", "email.smtp.username"))
            .merge(conventional_env("SMTP_PASS", "email.smtp.password"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Public URL for a path under the application, without doubled slashes
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.app_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

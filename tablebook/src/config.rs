//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `TABLEBOOK_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `TABLEBOOK_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `TABLEBOOK_RESERVATIONS__CONFLICT_CHECK=interval` sets the `reservations.conflict_check` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use tablebook::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Database**: `database.url`, `database.pool` - PostgreSQL connection settings
//! - **Authentication**: `auth.session`, `auth.proxy_header` - How callers are identified
//! - **Security**: `secret_key`, `auth.security` - JWT signing, expiry and CORS settings
//! - **Reservations**: `reservations.*` - Booking defaults and the table conflict check
//! - **Features**: `enable_otel_export` - Optional OTLP trace export

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

pub const DEFAULT_SESSION_COOKIE: &str = "tablebook_session";
pub const DEFAULT_PROXY_HEADER: &str = "x-tablebook-user";

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "TABLEBOOK_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the DATABASE_URL environment variable; overrides `database.url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// PostgreSQL connection settings
    pub database: DatabaseConfig,
    /// Secret key for JWT signing (required when session auth is enabled)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Reservation rules
    pub reservations: ReservationsConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string for the main database
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

/// Pool parameters handed to `PgPoolOptions`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    /// Time before idle connections are closed
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
}

/// Authentication configuration for all supported auth methods.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// JWT session cookie issued by the sign-in service
    pub session: SessionConfig,
    /// Proxy header-based authentication (for SSO integration)
    pub proxy_header: ProxyHeaderAuthConfig,
    /// Security settings (JWT, CORS)
    pub security: SecurityConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Accept JWT session cookies
    pub enabled: bool,
    /// Cookie name for session token
    pub cookie_name: String,
}

/// Proxy header-based authentication configuration.
///
/// Reads the caller's email from a header set by a trusted upstream proxy. Only enable this
/// when the service cannot be reached except through that proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyHeaderAuthConfig {
    pub enabled: bool,
    /// HTTP header carrying the authenticated user's email
    pub header_name: String,
    /// Create unknown users as diners on first sight
    pub auto_create_users: bool,
}

/// Security configuration for JWT and CORS.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// JWT token expiry duration
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// An allowed CORS origin: `*` or a URL.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// How a new booking is tested against existing bookings on the same table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictCheck {
    /// Reject when an active booking starts within one duration of the requested start,
    /// in either direction. Ignores the existing booking's own duration.
    #[default]
    Approximate,
    /// Reject when `[start, start + duration)` overlaps an active booking's interval.
    Interval,
}

/// Booking rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReservationsConfig {
    /// Duration applied when a request omits `duration_minutes`
    pub default_duration_minutes: i32,
    /// Longest accepted `duration_minutes`
    pub max_duration_minutes: i32,
    /// Largest accepted party size
    pub max_party_size: i32,
    pub conflict_check: ConflictCheck,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
            reservations: ReservationsConfig::default(),
            enable_otel_export: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/tablebook".to_string(),
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
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }
}

impl Default for ProxyHeaderAuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            header_name: DEFAULT_PROXY_HEADER.to_string(),
            auto_create_users: true,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
            cors: CorsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Url(Url::parse("http://localhost:3000").expect("static URL"))],
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

impl Default for ReservationsConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: 90,
            max_duration_minutes: 720,
            max_party_size: 50,
            conflict_check: ConflictCheck::Approximate,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.auth.session.enabled && self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: session authentication is enabled but secret_key is not configured. \
                 Please set TABLEBOOK_SECRET_KEY environment variable or add secret_key to config file."
                    .to_string(),
            });
        }

        if !self.auth.session.enabled && !self.auth.proxy_header.enabled {
            return Err(Error::Internal {
                operation: "Config validation: No authentication methods are enabled. Please enable either session or proxy_header authentication."
                    .to_string(),
            });
        }

        if self.auth.security.jwt_expiry.as_secs() < 300 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.auth.security.jwt_expiry.as_secs() > 86400 * 30 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too long (maximum 30 days)".to_string(),
            });
        }

        if self.auth.security.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self
            .auth
            .security
            .cors
            .allowed_origins
            .iter()
            .any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.auth.security.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        if self.reservations.default_duration_minutes <= 0 {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: reservations.default_duration_minutes must be positive (got {})",
                    self.reservations.default_duration_minutes
                ),
            });
        }

        if self.reservations.max_duration_minutes < self.reservations.default_duration_minutes {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: reservations.max_duration_minutes ({}) must be at least default_duration_minutes ({})",
                    self.reservations.max_duration_minutes, self.reservations.default_duration_minutes
                ),
            });
        }

        if self.reservations.max_party_size <= 0 {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: reservations.max_party_size must be positive (got {})",
                    self.reservations.max_party_size
                ),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("TABLEBOOK_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }
}

use crate::error::{GatherError, Result};
use std::env;
use url::Url;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Outgoing mail configuration
    pub mail: MailConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port for the API server (default: 3000)
    pub port: u16,
    /// Upper bound (exclusive) for the free-port scan when `port` is taken.
    /// A value at or below `port` disables scanning.
    pub port_scan_end: u16,
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Request timeout in seconds
    pub request_timeout: u64,
    /// Allowed CORS origins (comma-separated, empty = localhost only)
    pub cors_origins: Vec<String>,
    /// JWT secret for token generation
    pub jwt_secret: String,
    /// Lifetime of issued tokens
    pub jwt_expiry_hours: i64,
    /// Whether signup may request the ADMIN role
    pub allow_admin_signup: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts
    pub url: Option<String>,
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Database name
    pub name: String,
    /// SSL mode (disable, require, prefer)
    pub ssl_mode: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Minimum connections in pool
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Sender mailbox for outgoing mail
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            api: ApiServerConfig {
                port: get_env_or("API_PORT", "3000").parse().map_err(|_| {
                    GatherError::InvalidConfig("API_PORT must be a valid port number".into())
                })?,
                port_scan_end: get_env_or("API_PORT_SCAN_END", "4000").parse().map_err(|_| {
                    GatherError::InvalidConfig(
                        "API_PORT_SCAN_END must be a valid port number".into(),
                    )
                })?,
                host: get_env_or("API_HOST", "0.0.0.0"),
                request_timeout: get_env_or("API_REQUEST_TIMEOUT", "30")
                    .parse()
                    .unwrap_or(30),
                cors_origins: get_env_or("CORS_ORIGINS", "")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                jwt_secret: get_env_or("JWT_SECRET", ""),
                jwt_expiry_hours: parse_jwt_expiry_hours(&get_env_or("JWT_EXPIRY_HOURS", "24"))?,
                allow_admin_signup: get_env_or("ALLOW_ADMIN_SIGNUP", "false")
                    .parse()
                    .unwrap_or(false),
            },
            database: DatabaseConfig {
                url: parse_database_url()?,
                host: get_env_or("DB_HOST", "localhost"),
                port: get_env_or("DB_PORT", "5432").parse().map_err(|_| {
                    GatherError::InvalidConfig("DB_PORT must be a valid port number".into())
                })?,
                user: get_env_or("DB_USER", "gather"),
                password: get_env_or("DB_PASSWORD", "gather_password"),
                name: get_env_or("DB_NAME", "gather"),
                ssl_mode: get_env_or("DB_SSLMODE", "disable"),
                max_connections: get_env_or("DB_MAX_CONNECTIONS", "20")
                    .parse()
                    .map_err(|_| {
                        GatherError::InvalidConfig(
                            "DB_MAX_CONNECTIONS must be a valid number".into(),
                        )
                    })?,
                min_connections: get_env_or("DB_MIN_CONNECTIONS", "2").parse().map_err(|_| {
                    GatherError::InvalidConfig("DB_MIN_CONNECTIONS must be a valid number".into())
                })?,
            },
            mail: MailConfig {
                from: get_env_or("MAIL_FROM", "\"Event Management\" <noreply@eventapp.com>"),
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }

    /// Get the database connection URL
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url {
            return url.clone();
        }

        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.database.user,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.name,
            self.database.ssl_mode
        )
    }

    /// Get the API server address
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_database_url() -> Result<Option<String>> {
    let raw = env::var("DATABASE_URL").unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(raw).map_err(|e| {
        GatherError::InvalidConfig(format!("DATABASE_URL must be a valid URL: {}", e))
    })?;

    match url.scheme() {
        "postgres" | "postgresql" => {}
        other => {
            return Err(GatherError::InvalidConfig(format!(
                "DATABASE_URL has unsupported scheme: {}",
                other
            )))
        }
    }

    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(GatherError::InvalidConfig(
            "DATABASE_URL must include a host".into(),
        ));
    }

    Ok(Some(raw.to_string()))
}

/// Longest accepted token lifetime (one year)
pub const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 365;

fn parse_jwt_expiry_hours(raw: &str) -> Result<i64> {
    let hours: i64 = raw.trim().parse().map_err(|_| {
        GatherError::InvalidConfig("JWT_EXPIRY_HOURS must be a valid number".into())
    })?;

    if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&hours) {
        return Err(GatherError::InvalidConfig(format!(
            "JWT_EXPIRY_HOURS must be between 1 and {}",
            MAX_JWT_EXPIRY_HOURS
        )));
    }

    Ok(hours)
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

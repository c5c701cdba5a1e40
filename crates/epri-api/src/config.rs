//! Server configuration read from the environment.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Deployment environment. Production hides diagnostic detail from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local or staging deployment.
    #[default]
    Development,
    /// Public deployment.
    Production,
}

impl Environment {
    /// Whether error responses may carry the underlying error text.
    #[must_use]
    pub fn exposes_error_detail(self) -> bool {
        self == Self::Development
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "test" | "staging" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(AppError::Config(format!(
                "APP_ENV must be development or production, got {other:?}"
            ))),
        }
    }
}

/// Startup configuration.
#[derive(Clone)]
pub struct Config {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Maximum pool connections.
    pub max_connections: u32,
    /// How long a request waits for a pooled connection.
    pub acquire_timeout: Duration,
    /// Deployment environment.
    pub environment: Environment,
    /// Bearer token for the admin endpoints. `None` disables them.
    pub admin_token: Option<String>,
    /// OTLP/gRPC collector endpoint. `None` disables span export.
    pub otlp_endpoint: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("environment", &self.environment)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("otlp_endpoint", &self.otlp_endpoint)
            .finish()
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = non_empty(lookup("DATABASE_URL")).ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".into())
        })?;
        let host = non_empty(lookup("HOST")).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        if max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".into(),
            ));
        }
        let acquire_timeout_secs: u64 = parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?;
        let environment = parse_or(&lookup, "APP_ENV", Environment::default())?;

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            environment,
            admin_token: non_empty(lookup("ADMIN_TOKEN")),
            otlp_endpoint: non_empty(lookup("OTEL_EXPORTER_OTLP_ENDPOINT")),
        })
    }

    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a valid socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::database::ConnectionUrl;

/// Minimum signing secret length outside development
pub const MIN_SECRET_BYTES: usize = 32;

/// Upper bound on token lifetime (30 days)
pub const MAX_TOKEN_HOURS: u64 = 24 * 30;

/// Startup configuration faults. Every variant is fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Unsupported database scheme '{0}' (expected mysql)")]
    UnsupportedScheme(String),

    #[error("JWT_SECRET must be at least {MIN_SECRET_BYTES} bytes in {0:?} mode")]
    WeakSecret(Environment),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: ConnectionUrl,
    pub max_connections: u32,
    /// Seconds a caller may wait for a pooled connection
    pub connection_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
}

// Keep the secret out of debug output
impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

/// Profile defaults before env overrides are applied. Required values
/// (database URL, signing secret) have no default.
struct Profile {
    max_connections: u32,
    connection_timeout: u64,
    request_timeout_secs: u64,
    max_request_size_bytes: usize,
    jwt_expiry_hours: u64,
    cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let profile = match environment {
            Environment::Production => Profile::production(),
            Environment::Staging => Profile::staging(),
            Environment::Development => Profile::development(),
        };

        let raw_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let url = ConnectionUrl::parse(&raw_url)?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            if environment == Environment::Development {
                tracing::warn!(
                    "JWT_SECRET is shorter than {} bytes; acceptable only for development",
                    MIN_SECRET_BYTES
                );
            } else {
                return Err(ConfigError::WeakSecret(environment));
            }
        }

        let port = match lookup("API_PORT").or_else(|| lookup("PORT")) {
            Some(v) => parse_value("API_PORT", &v)?,
            None => 3000,
        };

        let cors_origins = match lookup("SECURITY_CORS_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => profile.cors_origins,
        };
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                key: "SECURITY_CORS_ORIGINS",
                value: origin.clone(),
            })?;
        }

        let max_connections: u32 = override_or(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            profile.max_connections,
        )?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        let jwt_expiry_hours: u64 = override_or(
            &lookup,
            "SECURITY_JWT_EXPIRY_HOURS",
            profile.jwt_expiry_hours,
        )?;
        if jwt_expiry_hours == 0 || jwt_expiry_hours > MAX_TOKEN_HOURS {
            return Err(ConfigError::Invalid {
                key: "SECURITY_JWT_EXPIRY_HOURS",
                value: jwt_expiry_hours.to_string(),
            });
        }

        Ok(Self {
            environment,
            database: DatabaseConfig {
                url,
                max_connections,
                connection_timeout: override_or(
                    &lookup,
                    "DATABASE_CONNECTION_TIMEOUT",
                    profile.connection_timeout,
                )?,
            },
            api: ApiConfig {
                bind: lookup("API_BIND").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                request_timeout_secs: override_or(
                    &lookup,
                    "API_REQUEST_TIMEOUT_SECS",
                    profile.request_timeout_secs,
                )?,
                max_request_size_bytes: override_or(
                    &lookup,
                    "API_MAX_REQUEST_SIZE_BYTES",
                    profile.max_request_size_bytes,
                )?,
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_expiry_hours,
                cors_origins,
            },
        })
    }
}

impl Profile {
    fn development() -> Self {
        Self {
            max_connections: 10,
            connection_timeout: 30,
            request_timeout_secs: 30,
            max_request_size_bytes: 1024 * 1024, // 1MB
            jwt_expiry_hours: 24,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }

    fn staging() -> Self {
        Self {
            max_connections: 20,
            connection_timeout: 10,
            request_timeout_secs: 15,
            max_request_size_bytes: 256 * 1024,
            jwt_expiry_hours: 8,
            cors_origins: Vec::new(),
        }
    }

    fn production() -> Self {
        Self {
            max_connections: 50,
            connection_timeout: 5,
            request_timeout_secs: 10,
            max_request_size_bytes: 256 * 1024,
            jwt_expiry_hours: 4,
            cors_origins: Vec::new(),
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn override_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

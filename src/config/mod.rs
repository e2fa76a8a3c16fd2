use chrono::Duration;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared editor password. Empty means logins are refused.
    #[serde(skip_serializing)]
    pub edit_password: String,
    pub session_hours: i64,
    pub login_max_attempts: usize,
    pub login_window_secs: i64,
}

/// Longest session a login can open: one year
pub const MAX_SESSION_HOURS: i64 = 24 * 365;
/// Longest login rate-limit window: one day
pub const MAX_LOGIN_WINDOW_SECS: i64 = 24 * 60 * 60;

impl AuthConfig {
    pub fn session_lifetime(&self) -> Duration {
        Duration::hours(self.session_hours.clamp(1, MAX_SESSION_HOURS))
    }

    pub fn login_window(&self) -> Duration {
        Duration::seconds(self.login_window_secs.clamp(1, MAX_LOGIN_WINDOW_SECS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub data_cache_max_age_secs: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Value sent as Access-Control-Allow-Origin
    pub allowed_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("FINANCE_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.database.backend = match v.to_ascii_lowercase().as_str() {
                "postgres" | "pg" => StoreBackend::Postgres,
                "memory" | "mem" => StoreBackend::Memory,
                _ => self.database.backend,
            };
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        if let Ok(v) = env::var("FINANCE_EDIT_PASSWORD") {
            self.auth.edit_password = v;
        }
        if let Ok(v) = env::var("SESSION_DURATION_HOURS") {
            self.auth.session_hours = bounded(&v, MAX_SESSION_HOURS).unwrap_or(self.auth.session_hours);
        }
        if let Ok(v) = env::var("LOGIN_MAX_ATTEMPTS") {
            self.auth.login_max_attempts = v.parse().unwrap_or(self.auth.login_max_attempts);
        }
        if let Ok(v) = env::var("LOGIN_WINDOW_SECS") {
            self.auth.login_window_secs =
                bounded(&v, MAX_LOGIN_WINDOW_SECS).unwrap_or(self.auth.login_window_secs);
        }

        // API overrides
        if let Ok(v) = env::var("DATA_CACHE_MAX_AGE_SECS") {
            self.api.data_cache_max_age_secs = v.parse().unwrap_or(self.api.data_cache_max_age_secs);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SITE_URL") {
            self.security.allowed_origin = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            auth: AuthConfig {
                edit_password: "mepie2024admin".to_string(),
                session_hours: 8,
                login_max_attempts: 5,
                login_window_secs: 60,
            },
            api: ApiConfig {
                data_cache_max_age_secs: 300,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                allowed_origin: "*".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            auth: AuthConfig {
                edit_password: String::new(),
                session_hours: 8,
                login_max_attempts: 5,
                login_window_secs: 60,
            },
            api: ApiConfig {
                data_cache_max_age_secs: 60,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                allowed_origin: "*".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8080 },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            auth: AuthConfig {
                edit_password: String::new(),
                session_hours: 8,
                login_max_attempts: 5,
                login_window_secs: 60,
            },
            api: ApiConfig {
                data_cache_max_age_secs: 300,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                allowed_origin: "*".to_string(),
            },
        }
    }
}

/// Parse a positive count no larger than `max`
fn bounded(raw: &str, max: i64) -> Option<i64> {
    let value: i64 = raw.trim().parse().ok()?;
    if (1..=max).contains(&value) {
        Some(value)
    } else {
        tracing::warn!("Ignoring out-of-range value '{}' (allowed 1..={})", raw, max);
        None
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.auth.session_hours, 8);
        assert_eq!(config.auth.login_max_attempts, 5);
        assert!(!config.auth.edit_password.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert!(config.auth.edit_password.is_empty());
        assert_eq!(config.auth.login_window_secs, 60);
    }

    #[test]
    fn out_of_range_durations_are_rejected_or_clamped() {
        assert_eq!(bounded("12", MAX_SESSION_HOURS), Some(12));
        assert_eq!(bounded("0", MAX_SESSION_HOURS), None);
        assert_eq!(bounded("-3", MAX_SESSION_HOURS), None);
        assert_eq!(bounded("9223372036854775807", MAX_SESSION_HOURS), None);

        let mut config = AppConfig::development();
        config.auth.session_hours = i64::MAX;
        config.auth.login_window_secs = i64::MAX;
        assert_eq!(config.auth.session_lifetime(), Duration::hours(MAX_SESSION_HOURS));
        assert_eq!(config.auth.login_window(), Duration::seconds(MAX_LOGIN_WINDOW_SECS));
    }

    #[test]
    fn password_is_never_serialized() {
        let json = serde_json::to_value(AppConfig::development()).unwrap();
        assert!(json["auth"].get("edit_password").is_none());
    }
}

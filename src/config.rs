//! Configuration management for timetrack.
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every value has a default so the server starts with no setup.

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign bearer tokens.
    pub jwt_secret: String,
    /// Lifetime of issued tokens.
    pub jwt_expires_in: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, tokens will not survive a restart");
                nanoid::nanoid!(48)
            }
        };

        let expires_raw = env_or("JWT_EXPIRES_IN", "30d");
        let jwt_expires_in = parse_duration(&expires_raw).unwrap_or_else(|| {
            tracing::warn!(value = %expires_raw, "Invalid JWT_EXPIRES_IN, using 30d");
            Duration::from_secs(30 * 86_400)
        });

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "5001").parse().unwrap_or(5001),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/timetrack.db"),
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_expires_in,
            },
        }
    }
}

/// Parse a lifetime such as `30d`, `12h`, `15m`, `45s` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (digits, multiplier) = match value.chars().last()? {
        'd' => (&value[..value.len() - 1], 86_400),
        'h' => (&value[..value.len() - 1], 3_600),
        'm' => (&value[..value.len() - 1], 60),
        's' => (&value[..value.len() - 1], 1),
        _ => (value, 1),
    };

    let amount: u64 = digits.trim().parse().ok()?;
    if amount == 0 {
        return None;
    }
    amount.checked_mul(multiplier).map(Duration::from_secs)
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

use std::env;

use anyhow::{anyhow, Context};
use chrono::Weekday;
use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means entries, users and settings live in process memory.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,

    // Calendar used when a request does not name its own
    pub default_timezone: Tz,
    pub week_start: Weekday,
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> anyhow::Result<T> {
    let raw = env::var(name).unwrap_or_else(|_| default.into());
    raw.parse()
        .map_err(|_| anyhow!("{} must be a valid value, got {:?}", name, raw))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", "8080")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|extra| {
                    extra
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_access_ttl_secs: parse_var("JWT_ACCESS_TTL_SECS", "900")?,
            jwt_refresh_ttl_secs: parse_var("JWT_REFRESH_TTL_SECS", "604800")?,

            default_timezone: parse_var("DEFAULT_TIMEZONE", "UTC")?,
            week_start: parse_var("WEEK_START", "sun")?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),
            jwt_secret: "test-secret".into(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 604800,
            default_timezone: chrono_tz::UTC,
            week_start: Weekday::Sun,
        }
    }
}

use std::{env, str::FromStr};

use thiserror::Error;

/// Runtime settings, read from the process environment (and `.env`, see `main`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub pool_size: u32,
    pub jwt_secret: String,
    /// Seconds an access token stays valid
    pub access_token_lifetime: i64,
    /// Seconds a refresh token stays valid
    pub refresh_token_lifetime: i64,
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    Missing(&'static str),
    #[error("environment variable `{name}` has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Settings {
    pub fn from_env() -> Result<Settings, ConfigError> {
        Settings::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the settings from any key lookup, `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "blog.sqlite3".to_string()),
            pool_size: parse_or(&lookup, "DATABASE_POOL_SIZE", 8)?,
            jwt_secret,
            access_token_lifetime: parse_or(&lookup, "ACCESS_TOKEN_LIFETIME", 300)?,
            refresh_token_lifetime: parse_or(&lookup, "REFRESH_TOKEN_LIFETIME", 86_400)?,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

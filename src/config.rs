use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),
    #[error("Environment variable {key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub secret_key: String,
    pub bind_address: SocketAddr,
    pub token_lifetime_hours: i64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "5")?,
            redis_url: var("REDIS_URL"),
            secret_key: require("SECRET_KEY")?,
            bind_address: try_load("BIND_ADDRESS", "0.0.0.0:8000")?,
            token_lifetime_hours: try_load("TOKEN_LIFETIME_HOURS", "24")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    var(key).ok_or(ConfigError::Missing(key))
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        log::info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse(key, &value)
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| {
        log::warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values() {
        let address: SocketAddr = parse("BIND_ADDRESS", "127.0.0.1:8080").unwrap();
        assert_eq!(address.port(), 8080);

        let hours: i64 = parse("TOKEN_LIFETIME_HOURS", "12").unwrap();
        assert_eq!(hours, 12);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let error = parse::<u32>("DATABASE_MAX_CONNECTIONS", "many").unwrap_err();
        assert!(error.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }
}

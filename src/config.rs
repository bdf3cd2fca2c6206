//! Service configuration loaded from environment variables.
//!
//! - `HOST`: bind address (default `0.0.0.0`)
//! - `PORT`: listen port (default `3000`)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default `10`)

use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl ServerConfig {
    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT: {port}"))?,
            None => 3000,
        };

        let url = lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("Invalid DATABASE_MAX_CONNECTIONS: {value}"))?,
            None => 10,
        };

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url,
                max_connections,
            },
        })
    }
}

/// Loads the configuration from the process environment.
pub fn load() -> Result<Config> {
    Config::from_lookup(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/shop")]))
                .unwrap();

        assert_eq!(config.server.addr(), "0.0.0.0:3000");
        assert_eq!(config.database.url, "postgres://localhost/shop");
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://db/shop"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ]))
        .unwrap();

        assert_eq!(config.server.addr(), "127.0.0.1:8080");
        assert_eq!(config.database.max_connections, 4);
    }

    #[test]
    fn requires_database_url() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn rejects_invalid_numbers() {
        let bad_port = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/shop"),
            ("PORT", "eighty"),
        ]));
        assert!(bad_port.is_err());

        let zero_pool = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/shop"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]));
        assert!(zero_pool.is_err());
    }
}

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://word_memory.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    /// Upper bound on the words fetched when a study session starts.
    pub session_batch_size: u32,
    pub max_connections: u32,
    /// Idle study sessions older than this are dropped.
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            session_batch_size: 10,
            max_connections: 5,
            session_ttl: Duration::minutes(30),
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let host = lookup("HOST")
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(defaults.host);

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let session_batch_size = lookup("SESSION_BATCH_SIZE")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.session_batch_size);

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_connections);

        let session_ttl = lookup("SESSION_TTL_MINUTES")
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|minutes| *minutes > 0)
            .map(Duration::minutes)
            .unwrap_or(defaults.session_ttl);

        Self {
            database_url,
            host,
            port,
            session_batch_size,
            max_connections,
            session_ttl,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, 3000);
        assert_eq!(config.session_batch_size, 10);
        assert_eq!(config.session_ttl, Duration::minutes(30));
    }

    #[test]
    fn test_reads_values_and_ignores_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("HOST", "0.0.0.0"),
            ("PORT", "not-a-port"),
            ("SESSION_BATCH_SIZE", "25"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("SESSION_TTL_MINUTES", "90"),
        ]);
        let config = Config::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.session_batch_size, 25);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.session_ttl, Duration::minutes(90));
    }
}

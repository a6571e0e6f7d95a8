//! Server configuration loaded from environment variables

use std::time::Duration;

/// Listen port used when `PORT` is absent or not a valid port number
pub const DEFAULT_PORT: u16 = 9000;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Frames buffered per connection before broadcasts to it start dropping
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 5_000;

/// Runtime settings for the chat server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    pub outbound_capacity: usize,
    pub send_timeout: Duration,
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
            json_logs: false,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|v| v.trim().parse::<u16>().ok())
            .filter(|p| *p != 0)
            .unwrap_or(defaults.port);

        let bind_address = lookup("CHAT_BIND_ADDRESS")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.bind_address);

        let outbound_capacity = lookup("CHAT_OUTBOUND_CAPACITY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|c| *c > 0)
            .unwrap_or(defaults.outbound_capacity);

        let send_timeout = lookup("CHAT_SEND_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.send_timeout);

        let json_logs = lookup("CHAT_JSON_LOGS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.json_logs);

        Self {
            port,
            bind_address,
            outbound_capacity,
            send_timeout,
            json_logs,
        }
    }

    /// `host:port` string for binding the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = ServerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 9000);
        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_port_from_env() {
        let config = ServerConfig::from_lookup(lookup_from(&[("PORT", "8080")]));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        for bad in ["abc", "", "70000", "-1", "0"] {
            let config = ServerConfig::from_lookup(lookup_from(&[("PORT", bad)]));
            assert_eq!(config.port, DEFAULT_PORT, "PORT={bad:?}");
        }
    }

    #[test]
    fn test_tuning_knobs() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("CHAT_BIND_ADDRESS", "127.0.0.1"),
            ("CHAT_OUTBOUND_CAPACITY", "8"),
            ("CHAT_SEND_TIMEOUT_MS", "250"),
            ("CHAT_JSON_LOGS", "true"),
        ]));
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.outbound_capacity, 8);
        assert_eq!(config.send_timeout, Duration::from_millis(250));
        assert!(config.json_logs);
    }

    #[test]
    fn test_zero_capacity_falls_back() {
        let config = ServerConfig::from_lookup(lookup_from(&[("CHAT_OUTBOUND_CAPACITY", "0")]));
        assert_eq!(config.outbound_capacity, DEFAULT_OUTBOUND_CAPACITY);
    }
}

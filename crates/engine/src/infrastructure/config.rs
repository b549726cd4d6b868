//! Application configuration

use std::env;

use anyhow::{Context, Result};
use crossduel_domain::PuzzleId;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind host
    pub server_host: String,
    /// WebSocket server port
    pub server_port: u16,
    /// SQLite database path for the puzzle store
    pub puzzle_db_path: String,
    /// Puzzle every session loads
    pub puzzle_id: PuzzleId,
    /// Per-connection outbound queue capacity
    pub connection_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            puzzle_db_path: "./data/puzzles.db".to_string(),
            puzzle_id: PuzzleId::new(1),
            connection_buffer: 256,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let server_port = match lookup("SERVER_PORT").or_else(|| lookup("PORT")) {
            Some(port) => port
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            None => defaults.server_port,
        };

        let puzzle_id = match lookup("PUZZLE_ID") {
            Some(id) => PuzzleId::new(id.parse().context("PUZZLE_ID must be an integer")?),
            None => defaults.puzzle_id,
        };

        let connection_buffer = match lookup("CONNECTION_BUFFER") {
            Some(size) => size
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .context("CONNECTION_BUFFER must be a positive integer")?,
            None => defaults.connection_buffer,
        };

        Ok(Self {
            server_host: lookup("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            puzzle_db_path: lookup("PUZZLE_DB_PATH").unwrap_or(defaults.puzzle_db_path),
            puzzle_id,
            connection_buffer,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.puzzle_id, PuzzleId::new(1));
        assert_eq!(config.puzzle_db_path, "./data/puzzles.db");
        assert_eq!(config.connection_buffer, 256);
    }

    #[test]
    fn port_falls_back_to_port_variable() {
        let config = load(&[("PORT", "9000")]).unwrap();
        assert_eq!(config.server_port, 9000);

        let config = load(&[("PORT", "9000"), ("SERVER_PORT", "9100")]).unwrap();
        assert_eq!(config.server_port, 9100);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[("SERVER_PORT", "http")]).is_err());
        assert!(load(&[("PUZZLE_ID", "first")]).is_err());
        assert!(load(&[("CONNECTION_BUFFER", "0")]).is_err());
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            ("SERVER_HOST", "127.0.0.1"),
            ("PUZZLE_DB_PATH", "/tmp/p.db"),
            ("PUZZLE_ID", "12"),
            ("CONNECTION_BUFFER", "8"),
        ])
        .unwrap();
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.puzzle_db_path, "/tmp/p.db");
        assert_eq!(config.puzzle_id, PuzzleId::new(12));
        assert_eq!(config.connection_buffer, 8);
    }
}

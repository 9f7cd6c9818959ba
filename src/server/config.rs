//! Server configuration loaded from `bunnyhop.toml`.
//!
//! Search order: `$BUNNYHOP_CONFIG`, then `./bunnyhop.toml`, then
//! `../bunnyhop.toml`. A missing or unparseable file falls back to built-in
//! defaults. Environment variables override whatever was loaded.

use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::GameConfig;

mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 7878;
    pub const BROADCAST_CAPACITY: usize = crate::session::DEFAULT_BROADCAST_CAPACITY;
    pub const LOG_LEVEL: &str = "bunnyhop=info";
}

/// Root of `bunnyhop.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ListenConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[server]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    /// Updates buffered per connection before it starts dropping them.
    pub broadcast_capacity: usize,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.into(),
            port: defaults::PORT,
            broadcast_capacity: defaults::BROADCAST_CAPACITY,
        }
    }
}

/// `[logging]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.into(),
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Configuration for the running binary, loaded on first use.
pub static CONFIG: Lazy<ServerConfig> = Lazy::new(load_config);

const CONFIG_SEARCH_PATHS: &[&str] = &["bunnyhop.toml", "../bunnyhop.toml"];

/// Find and load `bunnyhop.toml`, then apply environment overrides.
pub fn load_config() -> ServerConfig {
    if let Ok(path) = std::env::var("BUNNYHOP_CONFIG") {
        let path = Path::new(&path);
        if path.exists() {
            info!("Loading config from BUNNYHOP_CONFIG: {}", path.display());
            return apply_env_overrides(load_from_path(path));
        }
        warn!("BUNNYHOP_CONFIG={} not found, searching defaults", path.display());
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return apply_env_overrides(load_from_path(path));
        }
    }

    debug!("No bunnyhop.toml found, using built-in defaults");
    apply_env_overrides(ServerConfig::default())
}

/// Load one file without environment overrides.
pub fn load_from_path(path: &Path) -> ServerConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                ServerConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            ServerConfig::default()
        }
    }
}

macro_rules! env_override {
    ($target:expr, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $target = v;
        }
    };
    ($target:expr, $key:expr, parse) => {
        match std::env::var($key).map(|s| s.parse()) {
            Ok(Ok(v)) => $target = v,
            Ok(Err(_)) => warn!("Ignoring unparseable {}", $key),
            Err(_) => {}
        }
    };
}

fn apply_env_overrides(mut config: ServerConfig) -> ServerConfig {
    env_override!(config.server.host, "BUNNYHOP_HOST");
    env_override!(config.server.port, "BUNNYHOP_PORT", parse);
    env_override!(config.logging.level, "BUNNYHOP_LOG");

    if let Ok(raw) = std::env::var("BUNNYHOP_SEED") {
        match raw.parse::<u64>() {
            Ok(v) => config.game.seed = Some(v),
            Err(_) => warn!("Ignoring unparseable BUNNYHOP_SEED"),
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:7878");
        assert_eq!(config.game, GameConfig::default());
        assert_eq!(config.logging.level, "bunnyhop=info");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[game]\nwin_threshold = 30\nseed = 4\n"
        )
        .unwrap();

        let config = load_from_path(file.path());

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.game.win_threshold, 30);
        assert_eq!(config.game.hand_size, 7);
        assert_eq!(config.game.seed, Some(4));
    }

    #[test]
    fn test_bad_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert_eq!(load_from_path(file.path()), ServerConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from_path(&dir.path().join("absent.toml"));
        assert_eq!(config, ServerConfig::default());
    }
}

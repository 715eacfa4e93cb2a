//! Environment-driven server configuration.
//!
//! Every key is optional. Missing keys use defaults; invalid values fall
//! back to defaults and leave a warning in [`ServerConfig::warnings`] so it
//! can be logged once logging is up.

use sadayizm_core::db::DB_FILE_NAME;
use sadayizm_core::elo::{default_profiles, EloProfile};
use sadayizm_core::repo::json_repo::JSON_FILE_NAME;
use sadayizm_core::{LogLevel, LoggingConfig};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_ELO_ENDPOINT: &str = "https://faceit.lcrypt.eu/";
const DEFAULT_NICKNAME_RESOLVER: &str = "https://faceitfinder.com/api/steam/";
const DEFAULT_ELO_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_ELO_ATTEMPTS: u32 = 3;
const DEFAULT_ELO_BACKOFF_MS: u64 = 500;
const DEFAULT_ELO_BATCH_SIZE: usize = 2;

/// Record store backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Json,
    Memory,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Json => "json",
            Self::Memory => "memory",
        }
    }
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json" => Ok(Self::Json),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage `{other}`; expected sqlite|json|memory")),
        }
    }
}

/// Settings for the ELO board upstream.
#[derive(Debug, Clone)]
pub struct EloConfig {
    /// Rating lookup by Faceit nickname, queried as `?n=<nickname>`.
    pub endpoint: String,
    /// SteamID64 to Faceit nickname resolver, queried as `<base>/<steamid64>`.
    pub resolver_endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total tries per profile, at least 1.
    pub attempts: u32,
    /// Delay unit; attempt `n` waits `n * backoff` before the next try.
    pub backoff: Duration,
    /// Profiles fetched concurrently per batch.
    pub batch_size: usize,
    pub profiles: Vec<EloProfile>,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ELO_ENDPOINT.to_string(),
            resolver_endpoint: DEFAULT_NICKNAME_RESOLVER.to_string(),
            timeout: Duration::from_millis(DEFAULT_ELO_TIMEOUT_MS),
            attempts: DEFAULT_ELO_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_ELO_BACKOFF_MS),
            batch_size: DEFAULT_ELO_BATCH_SIZE,
            profiles: default_profiles(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub storage: StorageKind,
    /// Absolute directory holding `trolls.db` / `trolls.json`.
    pub data_dir: PathBuf,
    pub log_level: LogLevel,
    /// Absolute log directory.
    pub log_dir: PathBuf,
    pub elo: EloConfig,
    /// Problems found while loading, logged after logging starts.
    pub warnings: Vec<String>,
}

impl ServerConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut loader = Loader {
            lookup: &lookup,
            warnings: Vec::new(),
        };

        let data_dir = absolute(
            loader
                .text("SADAYIZM_DATA_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
        );
        let log_dir = loader
            .text("SADAYIZM_LOG_DIR")
            .map_or_else(|| data_dir.join("logs"), |dir| absolute(PathBuf::from(dir)));

        let elo = EloConfig {
            endpoint: loader
                .text("SADAYIZM_ELO_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ELO_ENDPOINT.to_string()),
            resolver_endpoint: loader
                .text("SADAYIZM_NICKNAME_RESOLVER")
                .unwrap_or_else(|| DEFAULT_NICKNAME_RESOLVER.to_string()),
            timeout: Duration::from_millis(
                loader.parsed("SADAYIZM_ELO_TIMEOUT_MS", DEFAULT_ELO_TIMEOUT_MS),
            ),
            attempts: loader
                .parsed("SADAYIZM_ELO_RETRIES", DEFAULT_ELO_ATTEMPTS)
                .max(1),
            ..EloConfig::default()
        };

        let bind = loader
            .text("SADAYIZM_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let port = loader.parsed("SADAYIZM_PORT", DEFAULT_PORT);
        let storage = loader.parsed("SADAYIZM_STORAGE", StorageKind::Sqlite);
        let log_level = loader.parsed("SADAYIZM_LOG_LEVEL", LogLevel::for_build());

        Self {
            bind,
            port,
            storage,
            data_dir,
            log_level,
            log_dir,
            elo,
            warnings: loader.warnings,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig::new(self.log_level, self.log_dir.clone())
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn json_path(&self) -> PathBuf {
        self.data_dir.join(JSON_FILE_NAME)
    }
}

struct Loader<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
    warnings: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> Loader<'_, F> {
    fn text(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parsed<T>(&mut self, key: &str, default: T) -> T
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        let Some(raw) = self.text(key) else {
            return default;
        };
        match raw.parse() {
            Ok(value) => value,
            Err(err) => {
                self.warnings
                    .push(format!("key={key} value={raw} error={err} fallback={default}"));
                default
            }
        }
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::{ServerConfig, StorageKind};
    use sadayizm_core::LogLevel;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert!(config.data_dir.is_absolute());
        assert!(config.data_dir.ends_with("data"));
        assert_eq!(config.log_dir, config.data_dir.join("logs"));
        assert_eq!(config.elo.attempts, 3);
        assert_eq!(config.elo.profiles.len(), 5);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            ("SADAYIZM_PORT", "8080"),
            ("SADAYIZM_STORAGE", "JSON"),
            ("SADAYIZM_DATA_DIR", "/srv/sadayizm"),
            ("SADAYIZM_ELO_TIMEOUT_MS", "1500"),
            ("SADAYIZM_ELO_RETRIES", "0"),
            ("SADAYIZM_NICKNAME_RESOLVER", "http://127.0.0.1:9000/steam"),
        ]);
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.storage, StorageKind::Json);
        assert_eq!(
            config.json_path(),
            std::path::PathBuf::from("/srv/sadayizm/trolls.json")
        );
        assert_eq!(config.elo.timeout, Duration::from_millis(1500));
        assert_eq!(config.elo.attempts, 1);
        assert_eq!(config.elo.resolver_endpoint, "http://127.0.0.1:9000/steam");
    }

    #[test]
    fn invalid_values_fall_back_with_warning() {
        let config = config_from(&[
            ("SADAYIZM_PORT", "http"),
            ("SADAYIZM_STORAGE", "redis"),
            ("SADAYIZM_LOG_LEVEL", "loud"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.log_level, LogLevel::for_build());
        assert_eq!(config.warnings.len(), 3);
        assert!(config.warnings[1].contains("SADAYIZM_STORAGE"));
        assert!(config.warnings[2].contains("SADAYIZM_LOG_LEVEL"));
    }
}

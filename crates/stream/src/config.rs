//! Run configuration.
//!
//! Precedence, lowest first: [`Config::default`], a JSON file
//! ([`Config::from_json_file`]), `CBOW_*` environment variables ([`from_env`]),
//! then whatever the caller applies on top (the CLI applies its flags).
//! Call [`Config::validate`] before use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokenize::OverflowPolicy;

/// Environment variable prefix (e.g. `CBOW_CAPACITY`).
pub const ENV_PREFIX: &str = "CBOW_";

const ENV_CORPUS: &str = "CORPUS";
const ENV_CAPACITY: &str = "CAPACITY";
const ENV_WINDOW_RADIUS: &str = "WINDOW_RADIUS";
const ENV_SOURCES_PER_BATCH: &str = "SOURCES_PER_BATCH";
const ENV_BATCHES: &str = "BATCHES";
const ENV_SEED: &str = "SEED";
const ENV_OVERFLOW: &str = "OVERFLOW";
const ENV_SNAPSHOT: &str = "SNAPSHOT";

const DEFAULT_CORPUS: &str = "data/corpus";
const DEFAULT_CAPACITY: u32 = 10_000;
const DEFAULT_WINDOW_RADIUS: usize = 2;
const DEFAULT_SOURCES_PER_BATCH: usize = 4;
const DEFAULT_BATCHES: usize = 10;
const DEFAULT_SEED: u64 = 42;

/// Errors produced when loading or validating configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Values are out of range
    #[error("config validation: {0}")]
    Validation(String),
    /// An environment variable could not be read (e.g. not Unicode)
    #[error("env var {key}: {message}")]
    EnvVar {
        /// full variable name
        key: String,
        /// underlying cause
        message: String,
    },
    /// An environment variable was set but did not parse
    #[error("env var {key}={value:?}: {message}")]
    Parse {
        /// full variable name
        key: String,
        /// raw value
        value: String,
        /// parse failure
        message: String,
    },
    /// A config file could not be read or decoded
    #[error("config file {path}: {message}")]
    File {
        /// file that failed
        path: String,
        /// underlying cause
        message: String,
    },
}

/// Settings for one streaming run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// corpus directory (random `.txt` draws) or file (one document per line)
    pub corpus: PathBuf,
    /// maximum number of distinct words in the vocabulary
    pub capacity: u32,
    /// context words taken on each side of the centre
    pub window_radius: usize,
    /// draws per batch
    pub sources_per_batch: usize,
    /// batches per run
    pub batches: usize,
    /// seed for random document draws
    pub seed: u64,
    /// what to do with words once the vocabulary is full
    pub overflow: OverflowPolicy,
    /// where to load/save the vocabulary snapshot, if anywhere
    pub snapshot: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: PathBuf::from(DEFAULT_CORPUS),
            capacity: DEFAULT_CAPACITY,
            window_radius: DEFAULT_WINDOW_RADIUS,
            sources_per_batch: DEFAULT_SOURCES_PER_BATCH,
            batches: DEFAULT_BATCHES,
            seed: DEFAULT_SEED,
            overflow: OverflowPolicy::Skip,
            snapshot: None,
        }
    }
}

impl Config {
    /// Read a JSON config file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_error = |message: String| ConfigError::File {
            path: path.display().to_string(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| file_error(e.to_string()))
    }

    /// Check ranges. `capacity`, `window_radius`, `sources_per_batch` and
    /// `batches` must all be at least 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Validation("capacity must be greater than 0".to_string()));
        }
        if self.window_radius == 0 {
            return Err(ConfigError::Validation(
                "window_radius must be greater than 0".to_string(),
            ));
        }
        if self.sources_per_batch == 0 {
            return Err(ConfigError::Validation(
                "sources_per_batch must be greater than 0".to_string(),
            ));
        }
        if self.batches == 0 {
            return Err(ConfigError::Validation("batches must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Full variable name for a suffix (`SEED` -> `CBOW_SEED`).
pub fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

fn env_string(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(s) => Ok(Some(s)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVar {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

fn env_parsed<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = env_string(key)? else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(t) => Ok(Some(t)),
        Err(e) => Err(ConfigError::Parse {
            key: key.to_string(),
            message: e.to_string(),
            value,
        }),
    }
}

/// Overlay `CBOW_*` environment variables on `base`. Unset variables keep
/// the base value; a set variable that fails to parse is an error.
pub fn from_env(base: Config) -> Result<Config, ConfigError> {
    Ok(Config {
        corpus: env_string(&env_key(ENV_CORPUS))?
            .map(PathBuf::from)
            .unwrap_or(base.corpus),
        capacity: env_parsed(&env_key(ENV_CAPACITY))?.unwrap_or(base.capacity),
        window_radius: env_parsed(&env_key(ENV_WINDOW_RADIUS))?.unwrap_or(base.window_radius),
        sources_per_batch: env_parsed(&env_key(ENV_SOURCES_PER_BATCH))?
            .unwrap_or(base.sources_per_batch),
        batches: env_parsed(&env_key(ENV_BATCHES))?.unwrap_or(base.batches),
        seed: env_parsed(&env_key(ENV_SEED))?.unwrap_or(base.seed),
        overflow: env_parsed(&env_key(ENV_OVERFLOW))?.unwrap_or(base.overflow),
        snapshot: env_string(&env_key(ENV_SNAPSHOT))?
            .map(PathBuf::from)
            .or(base.snapshot),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Env tests share process state.
    static CONFIG_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zeroes() {
        for cfg in [
            Config { capacity: 0, ..Config::default() },
            Config { window_radius: 0, ..Config::default() },
            Config { sources_per_batch: 0, ..Config::default() },
            Config { batches: 0, ..Config::default() },
        ] {
            assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
        }
    }

    #[test]
    fn json_file_overrides_only_given_fields() {
        let path = std::env::temp_dir().join("stream_config_partial.json");
        std::fs::write(&path, r#"{ "capacity": 500, "overflow": "unknown", "snapshot": "vocab.bin" }"#).unwrap();
        let cfg = Config::from_json_file(&path);
        let _ = std::fs::remove_file(&path);
        let cfg = cfg.unwrap();
        assert_eq!(cfg.capacity, 500);
        assert_eq!(cfg.overflow, OverflowPolicy::Unknown);
        assert_eq!(cfg.snapshot, Some(PathBuf::from("vocab.bin")));
        assert_eq!(cfg.window_radius, DEFAULT_WINDOW_RADIUS);
    }

    #[test]
    fn json_file_errors_name_the_file() {
        let path = std::env::temp_dir().join("stream_config_typo.json");
        std::fs::write(&path, r#"{ "capacty": 5 }"#).unwrap();
        let result = Config::from_json_file(&path);
        let _ = std::fs::remove_file(&path);
        match result {
            Err(ConfigError::File { path: p, .. }) => assert!(p.ends_with("stream_config_typo.json")),
            other => panic!("expected file error, got {other:?}"),
        }
        assert!(matches!(
            Config::from_json_file("/nonexistent/stream_config.json"),
            Err(ConfigError::File { .. })
        ));
    }

    #[test]
    fn from_env_falls_back_to_base() {
        let _g = CONFIG_ENV_LOCK.lock().unwrap();
        std::env::remove_var(env_key(ENV_CAPACITY));
        std::env::remove_var(env_key(ENV_SEED));
        let base = Config { seed: 9, ..Config::default() };
        let cfg = from_env(base.clone()).unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.capacity, base.capacity);
    }

    #[test]
    fn from_env_overrides_with_env_vars() {
        let _g = CONFIG_ENV_LOCK.lock().unwrap();
        let capacity = env_key(ENV_CAPACITY);
        let overflow = env_key(ENV_OVERFLOW);
        let snapshot = env_key(ENV_SNAPSHOT);
        std::env::set_var(&capacity, "77");
        std::env::set_var(&overflow, "unknown");
        std::env::set_var(&snapshot, "/tmp/v.bin");
        let cfg = from_env(Config::default());
        std::env::remove_var(&capacity);
        std::env::remove_var(&overflow);
        std::env::remove_var(&snapshot);
        let cfg = cfg.unwrap();
        assert_eq!(cfg.capacity, 77);
        assert_eq!(cfg.overflow, OverflowPolicy::Unknown);
        assert_eq!(cfg.snapshot, Some(PathBuf::from("/tmp/v.bin")));
    }

    #[test]
    fn from_env_returns_error_on_invalid_parse() {
        let _g = CONFIG_ENV_LOCK.lock().unwrap();
        let key = env_key(ENV_WINDOW_RADIUS);
        std::env::set_var(&key, "wide");
        let res = from_env(Config::default());
        std::env::remove_var(&key);
        match res {
            Err(ConfigError::Parse { key: k, value, .. }) => {
                assert_eq!(k, "CBOW_WINDOW_RADIUS");
                assert_eq!(value, "wide");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::Validation("capacity must be greater than 0".to_string());
        assert!(e.to_string().contains("config validation"));
        let e = ConfigError::Parse {
            key: "CBOW_SEED".to_string(),
            value: "abc".to_string(),
            message: "invalid digit".to_string(),
        };
        assert!(e.to_string().contains("CBOW_SEED"));
        assert!(e.to_string().contains("abc"));
    }
}

//! Configuration: defaults, an optional TOML file, then environment overrides.
//!
//! ```toml
//! collection = "books"
//! validate_on_write = true
//! default_page_size = 5
//!
//! [logging]
//! dir = "logs"
//! level = "debug"
//! retention = 3
//! ```

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_COLLECTION: &str = "books";
pub const DEFAULT_PAGE_SIZE: usize = 5;
/// Looked up in the working directory when neither a flag nor `BOOKSTORE_CONFIG` names a file.
pub const LOCAL_CONFIG_FILE: &str = "bookstore.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub level: Option<String>,
    pub retention: Option<usize>,
}

impl LoggingConfig {
    /// Applies `BOOKSTORE_LOG_DIR`, `BOOKSTORE_LOG_LEVEL` and `BOOKSTORE_LOG_RETENTION`.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|k| std::env::var(k).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("BOOKSTORE_LOG_DIR") {
            self.dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = lookup("BOOKSTORE_LOG_LEVEL") {
            self.level = Some(level);
        }
        if let Some(r) = lookup("BOOKSTORE_LOG_RETENTION") {
            match r.parse::<usize>() {
                Ok(n) => self.retention = Some(n),
                Err(_) => log::warn!("ignoring BOOKSTORE_LOG_RETENTION={r}: not a number"),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookstoreConfig {
    /// Name of the collection the CLI loads books into.
    pub collection: String,
    /// Check record shape locally before any write reaches the store.
    pub validate_on_write: bool,
    /// Page size used when a listing does not set one.
    pub default_page_size: usize,
    pub logging: LoggingConfig,
}

impl Default for BookstoreConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            validate_on_write: true,
            default_page_size: DEFAULT_PAGE_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key: key.to_string(), value: value.to_string() }),
    }
}

impl BookstoreConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.check()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_toml_str(&text)
    }

    /// Resolves the effective configuration.
    ///
    /// Precedence: explicit `path` > `BOOKSTORE_CONFIG` > `./bookstore.toml` > defaults for the
    /// file, then environment variables override whatever the file set. Command-line flags are
    /// applied by the caller on top of the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |k| std::env::var(k).ok())
    }

    /// [`load`](Self::load) with an injectable environment, for tests.
    pub fn load_with(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = path.map(Path::to_path_buf).or_else(|| lookup("BOOKSTORE_CONFIG").map(PathBuf::from));
        let mut cfg = match file {
            Some(p) => Self::from_file(&p)?,
            None => {
                let local = PathBuf::from(LOCAL_CONFIG_FILE);
                if local.is_file() { Self::from_file(&local)? } else { Self::default() }
            }
        };
        cfg.apply_env_from(lookup)?;
        Ok(cfg)
    }

    /// Applies `BOOKSTORE_COLLECTION`, `BOOKSTORE_VALIDATE` and the logging variables.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(c) = lookup("BOOKSTORE_COLLECTION") {
            self.collection = c;
        }
        if let Some(v) = lookup("BOOKSTORE_VALIDATE") {
            self.validate_on_write = parse_bool("BOOKSTORE_VALIDATE", &v)?;
        }
        self.logging.apply_env_from(&lookup);
        self.check()
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::InvalidValue { key: "collection".into(), value: self.collection.clone() });
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::InvalidValue { key: "default_page_size".into(), value: "0".into() });
        }
        Ok(())
    }

    /// The part of the configuration the service itself uses.
    #[must_use]
    pub const fn service(&self) -> ServiceConfig {
        ServiceConfig { validate_on_write: self.validate_on_write, default_page_size: self.default_page_size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub validate_on_write: bool,
    pub default_page_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        BookstoreConfig::default().service()
    }
}

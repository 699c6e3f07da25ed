//! Optional defaults read from `config.toml`, so the connection prompts do not
//! have to be answered on every invocation. Command-line flags always win.
//!
//! ```toml
//! [database]
//! host = "localhost"
//! user = "analyst"
//! schema = "stats"
//! table = "prices"
//!
//! [file]
//! delimiter = ";"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::file::FileOptions;
use crate::models::ConnectionParams;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Parsed configuration file. Every field is optional.
pub struct Config {
    pub database: DatabaseDefaults,
    pub file: FileDefaults,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Fallbacks for each connection parameter.
pub struct DatabaseDefaults {
    pub host: String,
    pub user: String,
    pub password: String,
    pub schema: String,
    pub table: String,
}

impl Default for DatabaseDefaults {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: String::new(),
            password: String::new(),
            schema: "tabsync".to_string(),
            table: "dataset".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Dialect used when reading and writing files.
pub struct FileDefaults {
    /// Single ASCII character; `\t` for tab-separated files.
    pub delimiter: String,
}

impl Default for FileDefaults {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
        }
    }
}

/// Per-invocation values that override the file. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
}

impl Config {
    /// Load `explicit` if given (it must exist), otherwise the per-user config
    /// file if present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Merge command-line values over the configured defaults.
    pub fn connection(&self, overrides: &ConnectionOverrides) -> ConnectionParams {
        let db = &self.database;
        let pick = |value: &Option<String>, fallback: &str| {
            value.clone().unwrap_or_else(|| fallback.to_string())
        };
        ConnectionParams::new(
            pick(&overrides.host, &db.host),
            pick(&overrides.user, &db.user),
            pick(&overrides.password, &db.password),
            pick(&overrides.schema, &db.schema),
            pick(&overrides.table, &db.table),
        )
    }

    pub fn file_options(&self) -> Result<FileOptions> {
        let delimiter = match self.file.delimiter.as_str() {
            "\\t" | "\t" => b'\t',
            other => match other.as_bytes() {
                [byte] if byte.is_ascii() => *byte,
                _ => {
                    return Err(anyhow!(
                        "delimiter must be a single ASCII character, got {other:?}"
                    ))
                }
            },
        };
        Ok(FileOptions {
            delimiter,
            ..FileOptions::default()
        })
    }
}

/// `<config dir>/tabsync/config.toml` on the current platform.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tabsync").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

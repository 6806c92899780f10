//! Runtime configuration for the sheet tree.
//!
//! # Responsibility
//! - Load `SheetConfig` from JSON, with every field defaulted.
//! - Apply `SHEETTREE_*` environment overrides on top of the file.
//!
//! # Invariants
//! - A config returned by [`SheetConfig::load`] has passed validation.
//! - Blank environment values are ignored rather than clearing a field.

use crate::logging::default_log_level;
use crate::model::position::Position;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DATABASE_PATH: &str = "SHEETTREE_DB";
pub const ENV_ACCESS_TOKEN: &str = "SHEETTREE_TOKEN";
pub const ENV_LOG_LEVEL: &str = "SHEETTREE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SHEETTREE_LOG_DIR";
pub const ENV_SPREADSHEET_ID: &str = "SHEETTREE_SPREADSHEET_ID";

const DEFAULT_SPREADSHEET_ID: &str = "local";
const DEFAULT_RANGE: &str = "A:D";
const DEFAULT_LOG_DIR_NAME: &str = "sheettree-logs";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings shared by the CLI and embedders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    /// Identifier reported by the store in clear responses.
    pub spreadsheet_id: String,
    /// Column range read and appended to, e.g. `A:D`.
    pub range: String,
    /// Sheet database file; `None` keeps the sheet in memory.
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    /// Bearer token handed to the auth provider.
    pub access_token: Option<String>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            range: DEFAULT_RANGE.to_string(),
            database_path: None,
            log_level: None,
            log_dir: None,
            access_token: None,
        }
    }
}

impl SheetConfig {
    /// Reads `path` (or defaults when `None`), applies env overrides and
    /// validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Applies `SHEETTREE_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by the `ENV_*` names.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        if let Some(path) = value(ENV_DATABASE_PATH) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(token) = value(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            self.log_level = Some(level);
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(id) = value(ENV_SPREADSHEET_ID) {
            self.spreadsheet_id = id;
        }
    }

    /// Checks that the range names a column span and the id is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "spreadsheet_id cannot be empty".to_string(),
            ));
        }
        let range = Position::parse(&self.range);
        if range.row().is_none() || range.column().is_none() {
            return Err(ConfigError::Invalid(format!(
                "range must be a column range such as `A:D`, got `{}`",
                self.range
            )));
        }
        Ok(())
    }

    /// Configured level, or the build-mode default.
    pub fn effective_log_level(&self) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string())
    }

    /// Configured log directory, or one under the system temp dir.
    pub fn effective_log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME))
    }
}

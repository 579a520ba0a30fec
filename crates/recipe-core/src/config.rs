use crate::errors::{RecipeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = ".recipes/recipes.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
}

impl JournalMode {
    pub fn pragma_value(self) -> &'static str {
        match self {
            JournalMode::Wal => "wal",
            JournalMode::Delete => "delete",
        }
    }
}

impl std::str::FromStr for JournalMode {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wal" => Ok(JournalMode::Wal),
            "delete" => Ok(JournalMode::Delete),
            other => Err(RecipeError::Config(format!(
                "unknown journal mode '{}' (expected wal|delete)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout_ms: 5_000,
            journal_mode: JournalMode::Wal,
        }
    }
}

impl StoreConfig {
    /// Reads a YAML config file. Missing keys take their defaults; unknown keys fail.
    /// A relative `db_path` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RecipeError::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        let mut cfg: StoreConfig = serde_yaml::from_str(&raw).map_err(|e| {
            RecipeError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        if cfg.db_path.is_relative() {
            if let Some(dir) = path.parent() {
                cfg.db_path = dir.join(&cfg.db_path);
            }
        }
        Ok(cfg)
    }

    /// Applies `RECIPE_DB`, `RECIPE_BUSY_TIMEOUT_MS` and `RECIPE_JOURNAL_MODE`.
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_overrides(|k| std::env::var(k).ok())?;
        Ok(self)
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = get("RECIPE_DB") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("RECIPE_BUSY_TIMEOUT_MS") {
            self.busy_timeout_ms = v.parse().map_err(|e| {
                RecipeError::Config(format!("RECIPE_BUSY_TIMEOUT_MS='{}': {}", v, e))
            })?;
        }
        if let Some(v) = get("RECIPE_JOURNAL_MODE") {
            self.journal_mode = v.parse()?;
        }
        Ok(())
    }
}

use crate::storage::project_dirs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "config.yml";
pub const LOG_FILE: &str = "clienthub.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    List,
    Calendar,
    #[default]
    Kanban,
}

impl ViewKind {
    pub fn label(self) -> &'static str {
        match self {
            ViewKind::List => "List",
            ViewKind::Calendar => "Calendar",
            ViewKind::Kanban => "Kanban",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task slot to use instead of the located project/global one.
    pub storage_path: Option<PathBuf>,
    pub default_view: ViewKind,
    /// Where the interactive board writes its logs.
    pub log_file: Option<PathBuf>,
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub log_filter: Option<String>,
}

impl Config {
    /// Reads `path`, or the per-user config file when `path` is `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        if !path.exists() {
            debug!(config = %path.display(), "no config file; using defaults");
            return Ok(Config::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading {:?}", path))?;
        let cfg = Config::parse(&text).with_context(|| format!("parsing {:?}", path))?;
        info!(config = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(LOG_FILE)),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_and_missing_files_give_defaults() {
        assert_eq!(Config::parse("").expect("parse"), Config::default());
        let dir = tempdir().expect("tempdir");
        let cfg = Config::load(Some(&dir.path().join("absent.yml"))).expect("load");
        assert_eq!(cfg.default_view, ViewKind::Kanban);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = Config::parse("default_view: calendar\nlog_filter: clienthub=debug\n")
            .expect("parse");
        assert_eq!(cfg.default_view, ViewKind::Calendar);
        assert_eq!(cfg.log_filter.as_deref(), Some("clienthub=debug"));
        assert_eq!(cfg.storage_path, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "default_view: [nope").expect("write");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::parse("default_view: gantt").is_err());
    }
}

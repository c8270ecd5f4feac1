use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use taskrank_core::{DEFAULT_TOP, TimeFormats};
use taskrank_store::StoreConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreSection,
    pub time: TimeSection,
    pub display: DisplaySection,
}

/// Store file names; relative paths resolve against the taskrank home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub task_log: PathBuf,
    pub roster_log: PathBuf,
    pub weights: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSection {
    /// Pattern for typed times (chrono strftime syntax).
    pub input_format: String,
    /// Pattern for timestamps in the logs.
    pub record_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    pub top: usize,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            task_log: PathBuf::from("task_log.csv"),
            roster_log: PathBuf::from("roster_log.csv"),
            weights: PathBuf::from("weights.csv"),
        }
    }
}

impl Default for TimeSection {
    fn default() -> Self {
        let formats = TimeFormats::default();
        Self {
            input_format: formats.input,
            record_format: formats.record,
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self { top: DEFAULT_TOP }
    }
}

impl Config {
    pub fn formats(&self) -> TimeFormats {
        TimeFormats {
            input: self.time.input_format.clone(),
            record: self.time.record_format.clone(),
        }
    }

    pub fn store_config(&self, home: &Path) -> StoreConfig {
        StoreConfig {
            task_log: home.join(&self.store.task_log),
            roster_log: home.join(&self.store.roster_log),
            weights: home.join(&self.store.weights),
            formats: self.formats(),
        }
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

pub fn load_config(home: &Path) -> Result<Config> {
    let p = config_path(home);
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(home: &Path, cfg: &Config) -> Result<()> {
    let p = config_path(home);
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.display.top, 5);
        assert_eq!(
            cfg.store_config(dir.path()).task_log,
            dir.path().join("task_log.csv")
        );
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            config_path(dir.path()),
            "[store]\ntask_log = \"/tmp/elsewhere/.task_log\"\n\n[display]\ntop = 3\n",
        )
        .unwrap();

        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg.display.top, 3);
        assert_eq!(cfg.store.roster_log, PathBuf::from("roster_log.csv"));
        assert_eq!(
            cfg.store_config(dir.path()).task_log,
            PathBuf::from("/tmp/elsewhere/.task_log")
        );
        assert_eq!(cfg.formats(), TimeFormats::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.time.input_format = "%d/%m/%Y %H:%M".into();
        save_config(dir.path(), &cfg).unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), cfg);
    }
}

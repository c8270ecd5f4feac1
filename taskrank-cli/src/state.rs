use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `--home`, else `$TASKRANK_HOME`, else `$HOME/.taskrank`.
pub fn taskrank_home(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os("TASKRANK_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set (or pass --home)")?;
    Ok(PathBuf::from(home).join(".taskrank"))
}

pub fn ensure_taskrank_home(flag: Option<PathBuf>) -> Result<PathBuf> {
    let dir = taskrank_home(flag)?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

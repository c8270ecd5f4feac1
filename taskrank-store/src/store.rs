//! Flat-file store: task log, roster log and the weights record.
//!
//! The store is touched only at session boundaries. Every save first copies
//! the previous file to a `<file>_backup` sibling, then writes a temp sibling
//! and renames it into place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use taskrank_core::{Error, Result, Roster, Task, TimeFormats, Weights};

use crate::records;

/// Where the store reads and writes, and how timestamps look on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub task_log: PathBuf,
    pub roster_log: PathBuf,
    pub weights: PathBuf,
    pub formats: TimeFormats,
}

impl StoreConfig {
    /// Default file names under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            task_log: dir.join("task_log.csv"),
            roster_log: dir.join("roster_log.csv"),
            weights: dir.join("weights.csv"),
            formats: TimeFormats::default(),
        }
    }
}

/// Everything loaded at session start and saved at session end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub rosters: Vec<Roster>,
}

#[derive(Debug, Clone)]
pub struct LogStore {
    config: StoreConfig,
}

impl LogStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot {
            tasks: self.load_tasks()?,
            rosters: self.load_rosters()?,
        };
        info!(
            "loaded {} task(s) and {} roster(s)",
            snapshot.tasks.len(),
            snapshot.rosters.len()
        );
        Ok(snapshot)
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.save_tasks(&snapshot.tasks)?;
        self.save_rosters(&snapshot.rosters)?;
        info!(
            "saved {} task(s) and {} roster(s)",
            snapshot.tasks.len(),
            snapshot.rosters.len()
        );
        Ok(())
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        records::read_tasks(&self.config.task_log, &self.config.formats)
    }

    pub fn load_rosters(&self) -> Result<Vec<Roster>> {
        records::read_rosters(&self.config.roster_log, &self.config.formats)
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        let formats = &self.config.formats;
        replace_with_backup(&self.config.task_log, |out| {
            records::write_tasks(out, tasks, formats)
        })
    }

    pub fn save_rosters(&self, rosters: &[Roster]) -> Result<()> {
        let formats = &self.config.formats;
        replace_with_backup(&self.config.roster_log, |out| {
            records::write_rosters(out, rosters, formats)
        })
    }

    /// First non-blank line of the weights file.
    pub fn load_weights(&self) -> Result<Weights> {
        let path = &self.config.weights;
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let line = text
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} holds no weights", path.display())))?;
        Weights::parse(line)
    }

    pub fn save_weights(&self, weights: &Weights) -> Result<()> {
        let path = &self.config.weights;
        fs::write(path, format!("{}\n", weights.to_line())).map_err(|e| Error::io(path, e))
    }

    /// Create whichever store files are missing; existing files are left alone.
    pub fn init(&self, weights: &Weights) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for file in [&self.config.task_log, &self.config.roster_log] {
            if !file.exists() {
                create_parent(file)?;
                File::create(file).map_err(|e| Error::io(file, e))?;
                created.push(file.clone());
            }
        }
        if !self.config.weights.exists() {
            create_parent(&self.config.weights)?;
            self.save_weights(weights)?;
            created.push(self.config.weights.clone());
        }
        Ok(created)
    }
}

/// `<file>_backup` next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, "_backup")
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
        }
        _ => Ok(()),
    }
}

fn replace_with_backup(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> csv::Result<()>,
) -> Result<()> {
    if path.exists() {
        let backup = backup_path(path);
        fs::copy(path, &backup).map_err(|e| Error::io(&backup, e))?;
        debug!("backed up {} to {}", path.display(), backup.display());
    }

    let tmp = sibling(path, ".tmp");
    let file = File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
    let mut out = BufWriter::new(file);
    write(&mut out).map_err(|e| match e.into_kind() {
        csv::ErrorKind::Io(source) => Error::io(&tmp, source),
        other => Error::Validation(format!("could not encode record: {other:?}")),
    })?;
    out.flush().map_err(|e| Error::io(&tmp, e))?;
    drop(out);

    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}

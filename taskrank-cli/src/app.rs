use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::info;
use std::path::PathBuf;

use taskrank_core::{PriorityEngine, TimeFormats, check_all};
use taskrank_store::{LogStore, Snapshot};

use crate::config::{Config, load_config};
use crate::state::ensure_taskrank_home;

/// Resolved home, configuration and store for one invocation.
#[derive(Debug, Clone)]
pub struct App {
    pub home: PathBuf,
    pub config: Config,
    pub store: LogStore,
}

impl App {
    pub fn open(home_flag: Option<PathBuf>) -> Result<Self> {
        let home = ensure_taskrank_home(home_flag)?;
        let config = load_config(&home)?;
        let store = LogStore::new(config.store_config(&home));
        Ok(Self {
            home,
            config,
            store,
        })
    }

    pub fn formats(&self) -> TimeFormats {
        self.config.formats()
    }

    pub fn top(&self) -> usize {
        self.config.display.top
    }

    /// Load both logs. Any failure here ends the process.
    pub fn load(&self) -> Result<Snapshot> {
        self.store.load().with_context(|| {
            format!(
                "could not read the task store in {} (run `taskrank init` to create it)",
                self.home.display()
            )
        })
    }

    /// Load, then let every due roster materialize its next task.
    pub fn load_and_tick(&self, now: NaiveDateTime) -> Result<(Snapshot, usize)> {
        let mut snapshot = self.load()?;
        let added = tick(&mut snapshot, now);
        Ok((snapshot, added))
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.store
            .save(snapshot)
            .with_context(|| format!("could not save the task store in {}", self.home.display()))
    }

    /// Ranking failures are reported per call; they never touch stored data.
    pub fn engine(&self) -> taskrank_core::Result<PriorityEngine> {
        self.store.load_weights().map(PriorityEngine::new)
    }
}

pub fn tick(snapshot: &mut Snapshot, now: NaiveDateTime) -> usize {
    let added = check_all(&mut snapshot.rosters, &mut snapshot.tasks, now);
    if added > 0 {
        info!("{added} task(s) scheduled from rosters");
    }
    added
}

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

//! Task model: one unit of work with a deadline and an hour counter.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time::as_days;

/// Core task type.
///
/// Only persisted fields live here; ranking output is kept in
/// [`crate::priority::RankedTask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub hours_spent: u32,
    pub start_time: NaiveDateTime,
    pub deadline: NaiveDateTime,
    /// Only meaningful once `finished`; holds the deadline until then.
    pub finish_time: NaiveDateTime,
    pub finished: bool,
}

impl Task {
    /// A fresh task covering `start_time..deadline`.
    pub fn scheduled(
        name: impl Into<String>,
        start_time: NaiveDateTime,
        deadline: NaiveDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            hours_spent: 0,
            start_time,
            deadline,
            finish_time: deadline,
            finished: false,
        }
    }

    /// A task entered by the user, starting at `now`.
    pub fn new_now(
        name: impl Into<String>,
        deadline: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self::scheduled(name.trim(), now, deadline))
    }

    /// Days until the deadline; negative once overdue.
    pub fn time_remaining(&self, now: NaiveDateTime) -> f64 {
        as_days(self.deadline - now)
    }

    /// Days since the task started.
    pub fn time_elapsed(&self, now: NaiveDateTime) -> f64 {
        as_days(now - self.start_time)
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        !self.finished && self.deadline < now
    }

    pub fn finish(&mut self, now: NaiveDateTime) {
        self.finished = true;
        self.finish_time = now;
    }

    /// Saturates at `u32::MAX`.
    pub fn log_hour(&mut self) {
        self.hours_spent = self.hours_spent.saturating_add(1);
    }
}

/// Names are written raw into one-line, comma-separated logs, so commas and
/// control characters (newlines included) are rejected.
pub fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("name must not be empty".into()));
    }
    if trimmed.contains(',') {
        return Err(Error::Validation(format!(
            "name '{trimmed}' must not contain commas"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(Error::Validation(format!(
            "name {trimmed:?} must not contain line breaks or control characters"
        )));
    }
    Ok(())
}

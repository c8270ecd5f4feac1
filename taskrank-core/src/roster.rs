//! Rosters: recurring task templates that spawn one task per period.

use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{Task, validate_name};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub name: String,
    pub next_start_time: NaiveDateTime,
    /// Time allotted to each materialized task.
    #[serde(with = "crate::time::serde_days")]
    pub duration: Duration,
    /// Gap between successive materializations.
    #[serde(with = "crate::time::serde_days")]
    pub period: Duration,
}

impl Roster {
    pub fn new(
        name: impl Into<String>,
        first_start: NaiveDateTime,
        period: Duration,
        duration: Duration,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        if period <= Duration::zero() {
            return Err(Error::Validation("roster period must be positive".into()));
        }
        if duration <= Duration::zero() {
            return Err(Error::Validation("roster duration must be positive".into()));
        }
        if first_start.checked_add_signed(period.max(duration)).is_none() {
            return Err(Error::Validation(format!(
                "roster '{}' spans past the last representable date",
                name.trim()
            )));
        }
        Ok(Self {
            name: name.trim().to_string(),
            next_start_time: first_start,
            duration,
            period,
        })
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.next_start_time <= now
    }

    /// Materialize the next instance if it has started.
    ///
    /// Produces at most one task per call even when several periods were
    /// missed; the schedule does not catch up. Fails, leaving the roster
    /// untouched, when the deadline or next start cannot be represented.
    pub fn check_due(&mut self, now: NaiveDateTime) -> Result<Option<Task>> {
        if !self.is_due(now) {
            return Ok(None);
        }

        let start = self.next_start_time;
        let (Some(deadline), Some(next_start)) = (
            start.checked_add_signed(self.duration),
            start.checked_add_signed(self.period),
        ) else {
            return Err(Error::Validation(format!(
                "roster '{}' cannot be scheduled past {start}",
                self.name
            )));
        };

        let missed = self.periods_missed(now);
        if missed > 0 {
            warn!(
                "roster '{}' is {} period(s) behind; materializing one instance",
                self.name, missed
            );
        }

        let task = Task::scheduled(self.name.clone(), start, deadline);
        self.next_start_time = next_start;
        debug!(
            "roster '{}' materialized task due {}, next start {}",
            self.name, task.deadline, self.next_start_time
        );
        Ok(Some(task))
    }

    /// Whole periods that have fully elapsed after the pending start.
    pub fn periods_missed(&self, now: NaiveDateTime) -> u64 {
        if now < self.next_start_time {
            return 0;
        }
        let behind = (now - self.next_start_time).num_microseconds();
        let period = self.period.num_microseconds();
        match (behind, period) {
            (Some(b), Some(p)) if p > 0 => (b / p) as u64,
            _ => 0,
        }
    }
}

/// Run [`Roster::check_due`] over every roster in order, appending new tasks.
///
/// A roster that cannot advance is skipped with a warning so the others still
/// run; the count covers only tasks actually added.
pub fn check_all(rosters: &mut [Roster], tasks: &mut Vec<Task>, now: NaiveDateTime) -> usize {
    let before = tasks.len();
    for roster in rosters.iter_mut() {
        match roster.check_due(now) {
            Ok(Some(task)) => tasks.push(task),
            Ok(None) => {}
            Err(e) => warn!("{e}"),
        }
    }
    tasks.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn weekly(name: &str, first_start: NaiveDateTime) -> Roster {
        Roster::new(name, first_start, Duration::days(7), Duration::days(2)).unwrap()
    }

    #[test]
    fn rejects_non_positive_spans() {
        assert!(Roster::new("gym", now(), Duration::zero(), Duration::days(1)).is_err());
        assert!(Roster::new("gym", now(), Duration::days(1), Duration::hours(-1)).is_err());
        assert!(Roster::new("gym, run", now(), Duration::days(1), Duration::days(1)).is_err());
    }

    #[test]
    fn rejects_spans_past_calendar_end() {
        let late = NaiveDateTime::MAX - Duration::days(3);
        assert!(matches!(
            Roster::new("gym", late, Duration::days(7), Duration::days(1)),
            Err(Error::Validation(_))
        ));
        assert!(Roster::new("gym", late, Duration::days(1), Duration::days(2)).is_ok());
    }

    #[test]
    fn unschedulable_roster_errors_without_advancing() {
        let start = NaiveDateTime::MAX - Duration::days(3);
        let mut r = Roster {
            name: "heat death".into(),
            next_start_time: start,
            duration: Duration::days(1),
            period: Duration::days(7),
        };
        assert!(matches!(r.check_due(NaiveDateTime::MAX), Err(Error::Validation(_))));
        assert_eq!(r.next_start_time, start);

        let mut rosters = vec![r, weekly("timesheet", now())];
        let mut tasks = Vec::new();
        assert_eq!(check_all(&mut rosters, &mut tasks, NaiveDateTime::MAX), 1);
        assert_eq!(tasks[0].name, "timesheet");
    }

    #[test]
    fn not_due_returns_nothing() {
        let mut r = weekly("timesheet", now() + Duration::minutes(1));
        assert!(r.check_due(now()).unwrap().is_none());
        assert_eq!(r.next_start_time, now() + Duration::minutes(1));
    }

    #[test]
    fn due_exactly_now_materializes() {
        let mut r = weekly("timesheet", now());
        let t = r.check_due(now()).unwrap().unwrap();
        assert_eq!(t.start_time, now());
        assert_eq!(r.next_start_time, now() + Duration::days(7));
    }

    #[test]
    fn one_day_late_materializes_single_task() {
        let old = now() - Duration::days(1);
        let mut r = weekly("timesheet", old);

        let t = r.check_due(now()).unwrap().unwrap();
        assert_eq!(t.name, "timesheet");
        assert_eq!(t.start_time, old);
        assert_eq!(t.deadline, old + Duration::days(2));
        assert_eq!(t.hours_spent, 0);
        assert!(!t.finished);
        assert_eq!(r.next_start_time, old + Duration::days(7));

        assert!(r.check_due(now()).unwrap().is_none());
    }

    #[test]
    fn far_behind_does_not_catch_up() {
        let old = now() - Duration::days(30);
        let mut r = weekly("timesheet", old);
        assert_eq!(r.periods_missed(now()), 4);

        assert!(r.check_due(now()).unwrap().is_some());
        assert_eq!(r.next_start_time, old + Duration::days(7));
        assert!(r.check_due(now()).unwrap().is_some());
        assert_eq!(r.next_start_time, old + Duration::days(14));
    }

    #[test]
    fn check_all_appends_in_roster_order() {
        let mut rosters = vec![
            weekly("a", now() - Duration::hours(1)),
            weekly("b", now() + Duration::days(1)),
            weekly("c", now() - Duration::days(3)),
        ];
        let mut tasks = vec![Task::scheduled("existing", now(), now() + Duration::days(1))];

        let added = check_all(&mut rosters, &mut tasks, now());
        assert_eq!(added, 2);
        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["existing", "a", "c"]);
        assert_eq!(rosters[1].next_start_time, now() + Duration::days(1));
    }
}

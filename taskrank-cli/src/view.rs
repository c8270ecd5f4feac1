//! Console rendering for tasks, rankings and rosters.

use chrono::NaiveDateTime;
use taskrank_core::{RankedTask, Roster, Task, TimeFormats, as_days};

/// Collection positions of unfinished tasks; task numbers are 1-based positions in this list.
pub fn open_indices(tasks: &[Task]) -> Vec<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.finished)
        .map(|(i, _)| i)
        .collect()
}

/// 1-based task number for a collection position.
pub fn number_of(open: &[usize], index: usize) -> Option<usize> {
    open.iter().position(|&i| i == index).map(|p| p + 1)
}

pub fn task_row(number: usize, task: &Task, now: NaiveDateTime, formats: &TimeFormats) -> String {
    let left = task.time_remaining(now);
    let when = if task.is_overdue(now) {
        format!("{:.2} days overdue", -left)
    } else {
        format!("{left:.2} days left")
    };
    format!(
        "#{number:<3} {:<28} due {} ({when}), {}h logged",
        task.name,
        formats.format_input(task.deadline),
        task.hours_spent
    )
}

pub fn finished_row(task: &Task, formats: &TimeFormats) -> String {
    format!(
        "  ✓  {:<28} finished {}, {}h logged",
        task.name,
        formats.format_input(task.finish_time),
        task.hours_spent
    )
}

pub fn ranked_row(number: usize, r: &RankedTask<'_>, formats: &TimeFormats) -> String {
    format!(
        "#{number:<3} {:<28} priority={:.3} [deadline={:.3} time={:.3} util={:.3}] due {} ({:.2} days)",
        r.task.name,
        r.priority,
        r.deadline_weight,
        r.time_weight,
        r.util_weight,
        formats.format_input(r.task.deadline),
        r.time_remaining
    )
}

pub fn roster_row(roster: &Roster, formats: &TimeFormats) -> String {
    format!(
        "{:<28} next {} every {} day(s), {} day(s) each",
        roster.name,
        formats.format_input(roster.next_start_time),
        trim_days(as_days(roster.period)),
        trim_days(as_days(roster.duration))
    )
}

fn trim_days(days: f64) -> String {
    let s = format!("{days:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn numbers_skip_finished_tasks() {
        let mut done = Task::scheduled("done", now(), now());
        done.finish(now());
        let tasks = vec![
            Task::scheduled("a", now(), now()),
            done,
            Task::scheduled("b", now(), now()),
        ];
        let open = open_indices(&tasks);
        assert_eq!(open, vec![0, 2]);
        assert_eq!(number_of(&open, 2), Some(2));
        assert_eq!(number_of(&open, 1), None);
    }

    #[test]
    fn overdue_rows_say_so() {
        let t = Task::scheduled("rent", now() - Duration::days(3), now() - Duration::hours(12));
        let row = task_row(1, &t, now(), &TimeFormats::default());
        assert!(row.contains("0.50 days overdue"), "{row}");
        assert!(row.contains("due 2026-05-01 00:00"), "{row}");
    }

    #[test]
    fn roster_row_trims_day_counts() {
        let r = Roster::new("review", now(), Duration::days(7), Duration::hours(36)).unwrap();
        let row = roster_row(&r, &TimeFormats::default());
        assert!(row.contains("every 7 day(s), 1.5 day(s) each"), "{row}");
    }
}

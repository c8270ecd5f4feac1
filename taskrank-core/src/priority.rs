//! Priority engine: a three-factor weighted score over unfinished tasks.
//!
//! Each factor is normalized across the ranked set so it sums to 1:
//! - deadline urgency: `exp(-p0 * |remaining / next_deadline|)`
//! - fair share: proportional time allocation minus the share of hours
//!   already spent, clamped at 0
//! - utilization: average hours per day since the task started
//!
//! The composite is `dw*p4 + tw*p5 + uw*(1 - p4 - p5)`. Ties keep the input
//! order.

use chrono::NaiveDateTime;
use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::Task;

pub const WEIGHT_COUNT: usize = 6;

/// Floor on elapsed days in the utilization term (one hour).
pub const MIN_ELAPSED_DAYS: f64 = 1.0 / 24.0;

/// How many ranked tasks the console shows by default.
pub const DEFAULT_TOP: usize = 5;

/// The six tuning parameters `p0..p5`. Only built through [`Weights::new`]
/// or [`Weights::parse`], so every value is finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weights([f64; WEIGHT_COUNT]);

impl Default for Weights {
    fn default() -> Self {
        Self([1.0, 0.0, 1.0, 1.0, 0.4, 0.4])
    }
}

impl Weights {
    pub fn new(params: [f64; WEIGHT_COUNT]) -> Result<Self> {
        if let Some(i) = params.iter().position(|p| !p.is_finite()) {
            return Err(Error::Config(format!("weight p{i} is not a finite number")));
        }
        Ok(Self(params))
    }

    /// Parse one comma-separated line of at least six floats.
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line
            .trim()
            .trim_end_matches(',')
            .split(',')
            .map(str::trim)
            .collect();

        if fields.len() < WEIGHT_COUNT || fields.iter().any(|f| f.is_empty()) {
            return Err(Error::Config(format!(
                "expected {WEIGHT_COUNT} comma-separated weights, found '{}'",
                line.trim()
            )));
        }
        if fields.len() > WEIGHT_COUNT {
            log::warn!(
                "ignoring {} weight value(s) beyond the first {WEIGHT_COUNT}",
                fields.len() - WEIGHT_COUNT
            );
        }

        let mut params = [0.0; WEIGHT_COUNT];
        for (i, field) in fields.iter().take(WEIGHT_COUNT).enumerate() {
            params[i] = field
                .parse()
                .map_err(|_| Error::Config(format!("weight p{i} '{field}' is not a number")))?;
        }
        Self::new(params)
    }

    pub fn to_line(&self) -> String {
        self.0
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn params(&self) -> [f64; WEIGHT_COUNT] {
        self.0
    }

    /// p0: how sharply urgency decays with relative time remaining.
    pub fn deadline_decay(&self) -> f64 {
        self.0[0]
    }

    /// p1: offset added to each task's hours in the fair-share term.
    pub fn hours_offset(&self) -> f64 {
        self.0[1]
    }

    /// p2: offset added to total hours in the fair-share term.
    pub fn total_hours_offset(&self) -> f64 {
        self.0[2]
    }

    /// p3: offset added to hours in the utilization term.
    pub fn utilization_offset(&self) -> f64 {
        self.0[3]
    }

    pub fn deadline_share(&self) -> f64 {
        self.0[4]
    }

    pub fn time_share(&self) -> f64 {
        self.0[5]
    }

    /// May go negative when `p4 + p5 > 1`; that is left to whoever tunes the weights.
    pub fn utilization_share(&self) -> f64 {
        1.0 - self.0[4] - self.0[5]
    }
}

/// One scored task, borrowed from the caller's collection.
#[derive(Debug, Clone, Serialize)]
pub struct RankedTask<'a> {
    /// Position in the slice passed to [`PriorityEngine::rank`].
    pub index: usize,
    pub task: &'a Task,
    pub time_remaining: f64,
    pub deadline_weight: f64,
    pub frac_time: f64,
    pub time_weight: f64,
    pub util_weight: f64,
    pub priority: f64,
}

#[derive(Debug, Clone)]
pub struct PriorityEngine {
    weights: Weights,
}

impl PriorityEngine {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    /// Score every unfinished task and return them by descending priority.
    pub fn rank<'a>(&self, tasks: &'a [Task], now: NaiveDateTime) -> Result<Vec<RankedTask<'a>>> {
        let open: Vec<(usize, &Task)> = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.finished)
            .collect();
        if open.is_empty() {
            return Ok(Vec::new());
        }

        let remaining: Vec<f64> = open.iter().map(|(_, t)| t.time_remaining(now)).collect();
        let (urgent, next_deadline) = most_urgent(&remaining);
        if next_deadline == 0.0 {
            return Err(Error::Validation(format!(
                "'{}' is due exactly now; relative urgency is undefined",
                open[urgent].1.name
            )));
        }

        let deadline = self.deadline_weights(&remaining, next_deadline)?;
        let frac = fair_share_fractions(&remaining, urgent, next_deadline)?;
        let time = self.time_weights(&open, &frac)?;
        let util = self.utilization_weights(&open, now)?;

        let w = &self.weights;
        let mut ranked: Vec<RankedTask<'a>> = open
            .iter()
            .enumerate()
            .map(|(i, &(index, task))| RankedTask {
                index,
                task,
                time_remaining: remaining[i],
                deadline_weight: deadline[i],
                frac_time: frac[i],
                time_weight: time[i],
                util_weight: util[i],
                priority: deadline[i] * w.deadline_share()
                    + time[i] * w.time_share()
                    + util[i] * w.utilization_share(),
            })
            .collect();

        ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        Ok(ranked)
    }

    fn deadline_weights(&self, remaining: &[f64], next_deadline: f64) -> Result<Vec<f64>> {
        let decay = self.weights.deadline_decay();
        let raw = remaining
            .iter()
            .map(|r| (-decay * (r / next_deadline).abs()).exp())
            .collect();
        normalize(raw, "deadline")
    }

    fn time_weights(&self, open: &[(usize, &Task)], frac: &[f64]) -> Result<Vec<f64>> {
        let total_hours: f64 = open.iter().map(|(_, t)| t.hours_spent as f64).sum();
        let denom = total_hours + self.weights.total_hours_offset();
        if denom == 0.0 || !denom.is_finite() {
            return Err(Error::Config(
                "fair-share denominator (total hours + p2) is zero".into(),
            ));
        }

        let raw: Vec<f64> = open
            .iter()
            .zip(frac)
            .map(|((_, t), f)| {
                let used = (t.hours_spent as f64 + self.weights.hours_offset()) / denom;
                (f - used).max(0.0)
            })
            .collect();

        if raw.iter().all(|v| *v == 0.0) {
            debug!("every task is at or over its fair share; time weight drops out");
            return Ok(raw);
        }
        normalize(raw, "time")
    }

    fn utilization_weights(&self, open: &[(usize, &Task)], now: NaiveDateTime) -> Result<Vec<f64>> {
        let raw = open
            .iter()
            .map(|(_, t)| {
                let elapsed = t.time_elapsed(now).max(MIN_ELAPSED_DAYS);
                (t.hours_spent as f64 + self.weights.utilization_offset()) / (24.0 * elapsed)
            })
            .collect();
        normalize(raw, "utilization")
    }
}

/// Only the first `n` entries, for display.
pub fn top<'r, 'a>(ranked: &'r [RankedTask<'a>], n: usize) -> &'r [RankedTask<'a>] {
    &ranked[..ranked.len().min(n)]
}

/// First position holding the smallest remaining time, and that value.
fn most_urgent(remaining: &[f64]) -> (usize, f64) {
    remaining
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, r)| if r < best.1 { (i, r) } else { best })
}

fn fair_share_fractions(remaining: &[f64], urgent: usize, next_deadline: f64) -> Result<Vec<f64>> {
    if next_deadline < 0.0 {
        // Overdue: all attention goes to the most overdue task.
        return Ok((0..remaining.len())
            .map(|i| if i == urgent { 1.0 } else { 0.0 })
            .collect());
    }
    normalize(
        remaining.iter().map(|r| next_deadline / r).collect(),
        "fair-share",
    )
}

fn normalize(values: Vec<f64>, component: &str) -> Result<Vec<f64>> {
    let sum: f64 = values.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return Err(Error::Config(format!(
            "{component} weights sum to {sum}; check the configured weights"
        )));
    }
    Ok(values.into_iter().map(|v| v / sum).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    const EPS: f64 = 1e-9;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    /// A task started `age_days` ago with `left_days` until its deadline.
    fn task(name: &str, age_days: i64, left_days: f64, hours: u32) -> Task {
        let mut t = Task::scheduled(
            name,
            now() - Duration::days(age_days),
            now() + crate::time::from_days(left_days),
        );
        t.hours_spent = hours;
        t
    }

    fn weights(p: [f64; 6]) -> Weights {
        Weights::new(p).unwrap()
    }

    fn sum(ranked: &[RankedTask<'_>], f: impl Fn(&RankedTask<'_>) -> f64) -> f64 {
        ranked.iter().map(f).sum()
    }

    #[test]
    fn parse_weights_line() {
        let w = Weights::parse("1.5, 0, 1, 1, 0.4, 0.3\n").unwrap();
        assert_eq!(w.params(), [1.5, 0.0, 1.0, 1.0, 0.4, 0.3]);
        assert!((w.utilization_share() - 0.3).abs() < EPS);

        let trailing = Weights::parse("1,0,1,1,0.4,0.4,").unwrap();
        assert_eq!(trailing, Weights::default());
        assert_eq!(Weights::parse(&Weights::default().to_line()).unwrap(), Weights::default());
    }

    #[test]
    fn parse_weights_rejects_short_or_garbage() {
        assert!(matches!(Weights::parse("1,2,3,4,5"), Err(Error::Config(_))));
        assert!(matches!(Weights::parse("1,2,x,4,5,6"), Err(Error::Config(_))));
        assert!(matches!(Weights::parse("1,2,,4,5,6"), Err(Error::Config(_))));
        assert!(matches!(Weights::parse("1,2,3,4,5,NaN"), Err(Error::Config(_))));
        assert!(matches!(Weights::parse(""), Err(Error::Config(_))));
    }

    #[test]
    fn weights_must_be_finite() {
        let mut p = Weights::default().params();
        p[3] = f64::INFINITY;
        assert!(matches!(Weights::new(p), Err(Error::Config(m)) if m.contains("p3")));
        p[3] = f64::NAN;
        assert!(Weights::new(p).is_err());
    }

    #[test]
    fn parse_weights_ignores_extra_values() {
        let w = Weights::parse("1,0,1,1,0.4,0.4,9,9").unwrap();
        assert_eq!(w, Weights::default());
    }

    #[test]
    fn empty_input_ranks_nothing() {
        let engine = PriorityEngine::new(Weights::default());
        assert!(engine.rank(&[], now()).unwrap().is_empty());

        let mut done = task("done", 1, 1.0, 0);
        done.finish(now());
        assert!(engine.rank(&[done], now()).unwrap().is_empty());
    }

    #[test]
    fn ranking_is_a_sorted_permutation_of_open_tasks() {
        let mut finished = task("finished", 3, 2.0, 4);
        finished.finish(now());
        let tasks = vec![
            task("a", 2, 4.0, 1),
            finished,
            task("b", 5, 0.5, 6),
            task("c", 1, 10.0, 0),
            task("d", 7, 3.0, 2),
        ];

        let engine = PriorityEngine::new(Weights::default());
        let ranked = engine.rank(&tasks, now()).unwrap();

        let mut indices: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        indices.sort();
        assert_eq!(indices, vec![0, 2, 3, 4]);
        for r in &ranked {
            assert_eq!(r.task, &tasks[r.index]);
        }
        for pair in ranked.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
    }

    #[test]
    fn every_component_is_normalized() {
        let tasks = vec![
            task("a", 2, 4.0, 1),
            task("b", 5, 0.5, 2),
            task("c", 1, 10.0, 0),
        ];
        let ranked = PriorityEngine::new(Weights::default())
            .rank(&tasks, now())
            .unwrap();

        assert!((sum(&ranked, |r| r.deadline_weight) - 1.0).abs() < EPS);
        assert!((sum(&ranked, |r| r.frac_time) - 1.0).abs() < EPS);
        assert!((sum(&ranked, |r| r.time_weight) - 1.0).abs() < EPS);
        assert!((sum(&ranked, |r| r.util_weight) - 1.0).abs() < EPS);
        assert!((sum(&ranked, |r| r.priority) - 1.0).abs() < EPS);
    }

    #[test]
    fn two_task_scores_match_hand_computation() {
        // p0 = ln 2 makes the raw deadline weights 1/2 and 1/4.
        let w = weights([std::f64::consts::LN_2, 0.0, 1.0, 1.0, 0.4, 0.4]);
        let tasks = vec![task("later", 1, 2.0, 0), task("sooner", 1, 1.0, 0)];
        let ranked = PriorityEngine::new(w).rank(&tasks, now()).unwrap();

        assert_eq!(ranked[0].task.name, "sooner");
        assert!((ranked[0].deadline_weight - 2.0 / 3.0).abs() < EPS);
        assert!((ranked[0].frac_time - 2.0 / 3.0).abs() < EPS);
        assert!((ranked[0].time_weight - 2.0 / 3.0).abs() < EPS);
        assert!((ranked[0].util_weight - 0.5).abs() < EPS);
        assert!((ranked[0].priority - (0.8 * 2.0 / 3.0 + 0.1)).abs() < EPS);
        assert!((ranked[1].priority - (0.8 / 3.0 + 0.1)).abs() < EPS);
    }

    #[test]
    fn overdue_task_takes_all_fair_share() {
        let tasks = vec![task("B", 1, 5.0, 0), task("A", 2, -1.0, 0)];
        let ranked = PriorityEngine::new(Weights::default())
            .rank(&tasks, now())
            .unwrap();

        let a = ranked.iter().find(|r| r.task.name == "A").unwrap();
        let b = ranked.iter().find(|r| r.task.name == "B").unwrap();
        assert!((a.time_remaining + 1.0).abs() < EPS);
        assert_eq!(a.frac_time, 1.0);
        assert_eq!(b.frac_time, 0.0);
        assert_eq!(ranked[0].task.name, "A");
    }

    #[test]
    fn over_allocated_task_gets_no_time_weight() {
        let w = weights([1.0, 0.0, 0.0, 1.0, 0.4, 0.4]);
        let tasks = vec![task("busy", 1, 2.0, 3), task("idle", 1, 2.0, 1)];
        let ranked = PriorityEngine::new(w).rank(&tasks, now()).unwrap();

        let busy = ranked.iter().find(|r| r.task.name == "busy").unwrap();
        let idle = ranked.iter().find(|r| r.task.name == "idle").unwrap();
        assert_eq!(busy.time_weight, 0.0);
        assert!((idle.time_weight - 1.0).abs() < EPS);
    }

    #[test]
    fn all_clamped_time_weights_drop_out() {
        let w = weights([1.0, 10.0, 1.0, 1.0, 0.4, 0.4]);
        let tasks = vec![task("a", 1, 2.0, 0), task("b", 1, 3.0, 0)];
        let ranked = PriorityEngine::new(w).rank(&tasks, now()).unwrap();

        assert!(ranked.iter().all(|r| r.time_weight == 0.0));
        assert!((sum(&ranked, |r| r.deadline_weight) - 1.0).abs() < EPS);
        assert!(ranked.iter().all(|r| r.priority.is_finite()));
    }

    #[test]
    fn deadline_exactly_now_is_rejected() {
        let tasks = vec![task("now", 1, 0.0, 0), task("later", 1, 2.0, 0)];
        let err = PriorityEngine::new(Weights::default())
            .rank(&tasks, now())
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn zero_fair_share_denominator_is_a_config_error() {
        let w = weights([1.0, 0.0, 0.0, 1.0, 0.4, 0.4]);
        let tasks = vec![task("a", 1, 2.0, 0)];
        let err = PriorityEngine::new(w).rank(&tasks, now()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn zero_utilization_is_a_config_error() {
        let w = weights([1.0, 0.0, 1.0, 0.0, 0.4, 0.4]);
        let tasks = vec![task("a", 1, 2.0, 0), task("b", 1, 3.0, 0)];
        let err = PriorityEngine::new(w).rank(&tasks, now()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn brand_new_task_is_floored() {
        let fresh = Task::scheduled("fresh", now(), now() + Duration::days(3));
        let tasks = vec![fresh, task("old", 10, 3.0, 0)];
        let ranked = PriorityEngine::new(Weights::default())
            .rank(&tasks, now())
            .unwrap();

        let fresh = ranked.iter().find(|r| r.task.name == "fresh").unwrap();
        assert!(fresh.util_weight.is_finite());
        // 1 / (24 * 1h) vs 1 / (24 * 10d): 240 to 1.
        assert!((fresh.util_weight - 240.0 / 241.0).abs() < EPS);
    }

    #[test]
    fn ties_keep_input_order() {
        let tasks = vec![task("first", 1, 2.0, 0), task("second", 1, 2.0, 0)];
        let ranked = PriorityEngine::new(Weights::default())
            .rank(&tasks, now())
            .unwrap();
        assert_eq!(ranked[0].task.name, "first");
        assert_eq!(ranked[1].task.name, "second");
    }

    #[test]
    fn top_truncates() {
        let tasks: Vec<Task> = (0..8)
            .map(|i| task(&format!("t{i}"), 1, 1.0 + i as f64, 0))
            .collect();
        let ranked = PriorityEngine::new(Weights::default())
            .rank(&tasks, now())
            .unwrap();
        assert_eq!(top(&ranked, DEFAULT_TOP).len(), 5);
        assert_eq!(top(&ranked[..2], DEFAULT_TOP).len(), 2);
    }
}

//! taskrank-core: tasks, rosters and the priority engine

pub mod error;
pub mod priority;
pub mod roster;
pub mod task;
pub mod time;

pub use error::{Error, Result};
pub use priority::{DEFAULT_TOP, MIN_ELAPSED_DAYS, PriorityEngine, RankedTask, Weights, top};
pub use roster::{Roster, check_all};
pub use task::{Task, validate_name};
pub use time::{MAX_SPAN_DAYS, TimeFormats, as_days, from_days, parse_duration_days, span_from_days};

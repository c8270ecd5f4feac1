use anyhow::{Context, Result};
use clap::Subcommand;

use taskrank_core::{Roster, parse_duration_days};

use crate::app::{App, now};
use crate::view;

#[derive(Subcommand, Debug)]
pub enum RosterCommand {
    /// Add a recurring task template
    Add {
        name: String,

        /// First start time, e.g. "2026-03-02 09:00"
        #[arg(long)]
        start: String,

        /// Days between instances
        #[arg(long)]
        period: String,

        /// Days allowed per instance (its deadline is start + duration)
        #[arg(long)]
        duration: String,
    },

    /// List rosters and their next start
    List,
}

pub fn run(app: &App, cmd: RosterCommand) -> Result<()> {
    match cmd {
        RosterCommand::Add {
            name,
            start,
            period,
            duration,
        } => add(app, &name, &start, &period, &duration),
        RosterCommand::List => list(app),
    }
}

fn add(app: &App, name: &str, start: &str, period: &str, duration: &str) -> Result<()> {
    let formats = app.formats();
    let first_start = formats.parse_input(start).context("--start")?;
    let period = parse_duration_days(period).context("--period")?;
    let duration = parse_duration_days(duration).context("--duration")?;
    let roster = Roster::new(name, first_start, period, duration)?;

    let (mut snapshot, added) = app.load_and_tick(now())?;
    println!("Added roster {}", view::roster_row(&roster, &formats));
    snapshot.rosters.push(roster);
    if added > 0 {
        println!("{added} task(s) scheduled from rosters.");
    }
    app.save(&snapshot)
}

fn list(app: &App) -> Result<()> {
    let (snapshot, added) = app.load_and_tick(now())?;
    let formats = app.formats();
    if snapshot.rosters.is_empty() {
        println!("No rosters.");
    }
    for r in &snapshot.rosters {
        println!("{}", view::roster_row(r, &formats));
    }
    if added > 0 {
        app.save(&snapshot)?;
    }
    Ok(())
}

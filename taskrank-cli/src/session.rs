//! Interactive session: load once, loop over the menu, save once.

use anyhow::Result;
use chrono::NaiveDateTime;
use std::io::{BufRead, Write};

use taskrank_core::{PriorityEngine, Roster, Task, TimeFormats, top};
use taskrank_store::Snapshot;

use crate::app::{App, tick};
use crate::prompt::{InputClosed, Prompter};
use crate::view;

const MENU: &str = "[f] finish a task  [h] log an hour  [n] new task  [r] new roster\n\
                    [l] list tasks  [o] list rosters  [q] save and quit";

pub struct Session<'a, R, W> {
    app: &'a App,
    snapshot: Snapshot,
    engine: taskrank_core::Result<PriorityEngine>,
    prompt: Prompter<R, W>,
    formats: TimeFormats,
    clock: fn() -> NaiveDateTime,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn start(app: &'a App, prompt: Prompter<R, W>, clock: fn() -> NaiveDateTime) -> Result<Self> {
        let snapshot = app.load()?;
        Ok(Self {
            app,
            snapshot,
            engine: app.engine(),
            prompt,
            formats: app.formats(),
            clock,
        })
    }

    /// Run until the user quits or input closes, then save.
    pub fn run(mut self) -> Result<Snapshot> {
        loop {
            let added = tick(&mut self.snapshot, (self.clock)());
            if added > 0 {
                writeln!(self.prompt.out(), "{added} task(s) scheduled from rosters.")?;
            }
            self.show_top()?;
            writeln!(self.prompt.out(), "\n{MENU}")?;

            let Some(choice) = self.prompt.line(">")? else {
                break;
            };
            let outcome = match choice.to_ascii_lowercase().as_str() {
                "f" => self.finish(),
                "h" => self.log_hour(),
                "n" => self.new_task(),
                "r" => self.new_roster(),
                "l" => self.list_tasks(),
                "o" => self.list_rosters(),
                "q" => break,
                "" => Ok(()),
                other => writeln!(self.prompt.out(), "Unknown choice '{other}'.").map_err(Into::into),
            };
            match outcome {
                // Edits made so far are still saved below.
                Err(e) if e.is::<InputClosed>() => {
                    writeln!(self.prompt.out(), "\n{e}")?;
                    break;
                }
                other => other?,
            }
        }

        self.app.save(&self.snapshot)?;
        writeln!(self.prompt.out(), "Saved.")?;
        Ok(self.snapshot)
    }

    fn show_top(&mut self) -> Result<()> {
        let now = (self.clock)();
        let n = self.app.top();
        let open = view::open_indices(&self.snapshot.tasks);
        let out = self.prompt.out();

        let engine = match &self.engine {
            Ok(engine) => engine,
            Err(e) => {
                writeln!(out, "\nRanking unavailable: {e}")?;
                return Ok(());
            }
        };
        match engine.rank(&self.snapshot.tasks, now) {
            Ok(ranked) if ranked.is_empty() => writeln!(out, "\nNothing to do.")?,
            Ok(ranked) => {
                writeln!(out, "\n== Top {} of {} ==", n.min(ranked.len()), ranked.len())?;
                for r in top(&ranked, n) {
                    let number = view::number_of(&open, r.index).unwrap_or(0);
                    writeln!(out, "{}", view::ranked_row(number, r, &self.formats))?;
                }
            }
            Err(e) => writeln!(out, "\nRanking unavailable: {e}")?,
        }
        Ok(())
    }

    /// Print the open tasks and let the user pick one by number.
    fn choose_task(&mut self, label: &str) -> Result<Option<usize>> {
        let open = view::open_indices(&self.snapshot.tasks);
        if open.is_empty() {
            writeln!(self.prompt.out(), "No unfinished tasks.")?;
            return Ok(None);
        }
        self.list_tasks()?;
        let picked = self
            .prompt
            .select(&format!("{label} (number, blank to cancel)"), open.len())?;
        Ok(picked.map(|p| open[p]))
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(i) = self.choose_task("Finish which task")? {
            let task = &mut self.snapshot.tasks[i];
            task.finish((self.clock)());
            let name = task.name.clone();
            writeln!(self.prompt.out(), "Finished '{name}'.")?;
        }
        Ok(())
    }

    fn log_hour(&mut self) -> Result<()> {
        if let Some(i) = self.choose_task("Log an hour on which task")? {
            let task = &mut self.snapshot.tasks[i];
            task.log_hour();
            let (name, hours) = (task.name.clone(), task.hours_spent);
            writeln!(self.prompt.out(), "'{name}' now has {hours}h logged.")?;
        }
        Ok(())
    }

    fn new_task(&mut self) -> Result<()> {
        let name = self.prompt.name("Task name")?;
        let label = format!("Deadline [{}]", self.formats.input);
        let deadline = self.prompt.time(&label)?;
        match Task::new_now(name, deadline, (self.clock)()) {
            Ok(task) => {
                writeln!(self.prompt.out(), "Added '{}'.", task.name)?;
                self.snapshot.tasks.push(task);
            }
            Err(e) => writeln!(self.prompt.out(), "{e}")?,
        }
        Ok(())
    }

    fn new_roster(&mut self) -> Result<()> {
        let name = self.prompt.name("Roster name")?;
        let label = format!("First start [{}]", self.formats.input);
        let first_start = self.prompt.time(&label)?;
        let period = self.prompt.days("Repeat every (days)")?;
        let duration = self.prompt.days("Time allowed per instance (days)")?;
        match Roster::new(name, first_start, period, duration) {
            Ok(roster) => {
                writeln!(self.prompt.out(), "Added roster '{}'.", roster.name)?;
                self.snapshot.rosters.push(roster);
            }
            Err(e) => writeln!(self.prompt.out(), "{e}")?,
        }
        Ok(())
    }

    fn list_tasks(&mut self) -> Result<()> {
        let now = (self.clock)();
        let open = view::open_indices(&self.snapshot.tasks);
        let out = self.prompt.out();
        for (n, &i) in open.iter().enumerate() {
            let row = view::task_row(n + 1, &self.snapshot.tasks[i], now, &self.formats);
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    fn list_rosters(&mut self) -> Result<()> {
        let out = self.prompt.out();
        if self.snapshot.rosters.is_empty() {
            writeln!(out, "No rosters.")?;
        }
        for r in &self.snapshot.rosters {
            writeln!(out, "{}", view::roster_row(r, &self.formats))?;
        }
        Ok(())
    }
}

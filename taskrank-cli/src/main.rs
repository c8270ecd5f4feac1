use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

use taskrank_core::{Task, Weights, top};

mod app;
mod config;
mod prompt;
mod roster_cmd;
mod session;
mod state;
mod view;

use app::{App, now};

#[derive(Parser, Debug)]
#[command(name = "taskrank", version, about = "Rank tasks by deadline, fair share and effort")]
struct Cli {
    /// Data directory (default: $TASKRANK_HOME or ~/.taskrank)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the data directory, empty logs, default weights and config.toml
    Init,

    /// Interactive menu (the default)
    Session,

    /// Print the priority ranking of unfinished tasks
    Rank {
        /// How many to show (default from config.toml [display].top)
        #[arg(long)]
        top: Option<usize>,

        /// Show every unfinished task
        #[arg(long, default_value_t = false)]
        all: bool,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List tasks; numbers are what `finish` and `log-hour` take
    List {
        /// Also show finished tasks
        #[arg(long, default_value_t = false)]
        finished: bool,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Add a task starting now
    Add {
        name: String,

        /// Deadline, e.g. "2026-03-02 17:00"
        #[arg(long)]
        deadline: String,
    },

    /// Mark a task finished
    Finish { number: usize },

    /// Log hours spent on a task
    LogHour {
        number: usize,

        #[arg(long, default_value_t = 1)]
        hours: u32,
    },

    /// Recurring task templates
    Roster {
        #[command(subcommand)]
        command: roster_cmd::RosterCommand,
    },
}

fn setup_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let app = App::open(cli.home)?;

    match cli.command.unwrap_or(Command::Session) {
        Command::Init => init(&app)?,
        Command::Session => {
            let stdin = io::stdin();
            let prompt = prompt::Prompter::new(stdin.lock(), io::stdout(), app.formats());
            session::Session::start(&app, prompt, now)?.run()?;
        }
        Command::Rank { top, all, json } => {
            let limit = if all { usize::MAX } else { top.unwrap_or(app.top()) };
            rank(&app, limit, json)?;
        }
        Command::List { finished, json } => list(&app, finished, json)?,
        Command::Add { name, deadline } => add(&app, &name, &deadline)?,
        Command::Finish { number } => finish(&app, number)?,
        Command::LogHour { number, hours } => log_hour(&app, number, hours)?,
        Command::Roster { command } => roster_cmd::run(&app, command)?,
    }

    Ok(())
}

fn init(app: &App) -> Result<()> {
    let cfg_path = config::config_path(&app.home);
    if !cfg_path.exists() {
        config::save_config(&app.home, &app.config)?;
        println!("Wrote {}", cfg_path.display());
    }
    let created = app
        .store
        .init(&Weights::default())
        .context("creating store files")?;
    for p in &created {
        println!("Wrote {}", p.display());
    }
    if created.is_empty() {
        println!("Store already initialized in {}", app.home.display());
    }
    Ok(())
}

fn rank(app: &App, limit: usize, json: bool) -> Result<()> {
    let now = now();
    let (snapshot, added) = app.load_and_tick(now)?;
    if added > 0 {
        app.save(&snapshot)?;
    }

    let engine = app.engine().context("loading weights")?;
    let ranked = engine.rank(&snapshot.tasks, now).context("ranking tasks")?;
    let shown = top(&ranked, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    if ranked.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }
    let open = view::open_indices(&snapshot.tasks);
    let formats = app.formats();
    for r in shown {
        let number = view::number_of(&open, r.index).unwrap_or(0);
        println!("{}", view::ranked_row(number, r, &formats));
    }
    Ok(())
}

fn list(app: &App, finished: bool, json: bool) -> Result<()> {
    let now = now();
    let (snapshot, added) = app.load_and_tick(now)?;
    if added > 0 {
        app.save(&snapshot)?;
    }

    if json {
        let tasks: Vec<&Task> = snapshot
            .tasks
            .iter()
            .filter(|t| finished || !t.finished)
            .collect();
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    let formats = app.formats();
    let open = view::open_indices(&snapshot.tasks);
    if open.is_empty() {
        println!("No unfinished tasks.");
    }
    for (n, &i) in open.iter().enumerate() {
        println!("{}", view::task_row(n + 1, &snapshot.tasks[i], now, &formats));
    }
    if finished {
        for t in snapshot.tasks.iter().filter(|t| t.finished) {
            println!("{}", view::finished_row(t, &formats));
        }
    }
    Ok(())
}

fn add(app: &App, name: &str, deadline: &str) -> Result<()> {
    let now = now();
    let deadline = app.formats().parse_input(deadline).context("--deadline")?;
    let task = Task::new_now(name, deadline, now)?;

    let (mut snapshot, _) = app.load_and_tick(now)?;
    println!("Added '{}'", task.name);
    snapshot.tasks.push(task);
    app.save(&snapshot)
}

fn finish(app: &App, number: usize) -> Result<()> {
    let now = now();
    let (mut snapshot, _) = app.load_and_tick(now)?;
    let i = resolve(&snapshot.tasks, number)?;
    snapshot.tasks[i].finish(now);
    println!("Finished '{}'", snapshot.tasks[i].name);
    app.save(&snapshot)
}

fn log_hour(app: &App, number: usize, hours: u32) -> Result<()> {
    let (mut snapshot, _) = app.load_and_tick(now())?;
    let i = resolve(&snapshot.tasks, number)?;
    let task = &mut snapshot.tasks[i];
    for _ in 0..hours {
        task.log_hour();
    }
    println!("'{}' now has {}h logged", task.name, task.hours_spent);
    app.save(&snapshot)
}

/// Task number (as printed by `list`) to collection index.
fn resolve(tasks: &[Task], number: usize) -> Result<usize> {
    let open = view::open_indices(tasks);
    if open.is_empty() {
        bail!("no unfinished tasks");
    }
    let pos = prompt::parse_selection(&number.to_string(), open.len())?;
    Ok(open[pos])
}

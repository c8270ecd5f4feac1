//! Comma-terminated log records for tasks and rosters.
//!
//! Task line:   `name,hours_spent,start_time,deadline,finish_time,finished,`
//! Roster line: `name,next_start_time,duration_days,period_days,`
//!
//! Timestamps use the record pattern from [`TimeFormats`]; the trailing comma
//! shows up as one empty field, which is dropped before counting. Lines are
//! raw: no field is ever quoted or unquoted, so names reach disk byte for byte.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::StringRecord;
use taskrank_core::{Error, Result, Roster, Task, TimeFormats, as_days, span_from_days, validate_name};

pub const TASK_FIELDS: usize = 6;
pub const ROSTER_FIELDS: usize = 4;

/// Read every task line; the first bad line aborts the whole load.
pub fn read_tasks(path: &Path, formats: &TimeFormats) -> Result<Vec<Task>> {
    read_records(path, TASK_FIELDS, |fields| parse_task(fields, formats))
}

pub fn read_rosters(path: &Path, formats: &TimeFormats) -> Result<Vec<Roster>> {
    read_records(path, ROSTER_FIELDS, |fields| parse_roster(fields, formats))
}

pub fn write_tasks<W: Write>(out: W, tasks: &[Task], formats: &TimeFormats) -> csv::Result<()> {
    let mut wtr = writer(out);
    for t in tasks {
        wtr.write_record([
            t.name.clone(),
            t.hours_spent.to_string(),
            formats.format_record(t.start_time),
            formats.format_record(t.deadline),
            formats.format_record(t.finish_time),
            String::from(if t.finished { "1" } else { "0" }),
            String::new(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_rosters<W: Write>(
    out: W,
    rosters: &[Roster],
    formats: &TimeFormats,
) -> csv::Result<()> {
    let mut wtr = writer(out);
    for r in rosters {
        wtr.write_record([
            r.name.clone(),
            formats.format_record(r.next_start_time),
            as_days(r.duration).to_string(),
            as_days(r.period).to_string(),
            String::new(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(out)
}

fn read_records<T>(
    path: &Path,
    expected: usize,
    parse: impl Fn(&[&str]) -> std::result::Result<T, String>,
) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .quoting(false)
        .from_reader(file);

    let mut out = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            corrupt(path, line, e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let fields = fields(&record);
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        if fields.len() != expected {
            return Err(corrupt(
                path,
                line,
                format!("expected {expected} fields, found {}", fields.len()),
            ));
        }
        out.push(parse(&fields).map_err(|reason| corrupt(path, line, reason))?);
    }
    Ok(out)
}

/// Trimmed fields without the empty one left by the terminating comma.
fn fields(record: &StringRecord) -> Vec<&str> {
    let mut fields: Vec<&str> = record.iter().map(str::trim).collect();
    if fields.len() > 1 && fields.last() == Some(&"") {
        fields.pop();
    }
    fields
}

fn parse_task(f: &[&str], formats: &TimeFormats) -> std::result::Result<Task, String> {
    validate_name(f[0]).map_err(|e| e.to_string())?;
    let hours_spent: u32 = f[1]
        .parse()
        .map_err(|_| format!("hours_spent '{}' is not a non-negative integer", f[1]))?;
    let finished = match f[5] {
        "1" => true,
        "0" => false,
        other => return Err(format!("finished flag '{other}' is not 0 or 1")),
    };

    Ok(Task {
        name: f[0].to_string(),
        hours_spent,
        start_time: timestamp(f[2], formats)?,
        deadline: timestamp(f[3], formats)?,
        finish_time: timestamp(f[4], formats)?,
        finished,
    })
}

fn parse_roster(f: &[&str], formats: &TimeFormats) -> std::result::Result<Roster, String> {
    let next_start = timestamp(f[1], formats)?;
    let duration = days(f[2])?;
    let period = days(f[3])?;
    Roster::new(f[0], next_start, period, duration).map_err(|e| e.to_string())
}

fn timestamp(text: &str, formats: &TimeFormats) -> std::result::Result<chrono::NaiveDateTime, String> {
    formats.parse_record(text).map_err(|e| e.to_string())
}

fn days(text: &str) -> std::result::Result<chrono::Duration, String> {
    let days: f64 = text
        .parse()
        .map_err(|_| format!("'{text}' is not a number of days"))?;
    span_from_days(days).map_err(|e| e.to_string())
}

fn corrupt(path: &Path, line: u64, reason: String) -> Error {
    Error::Corrupt {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

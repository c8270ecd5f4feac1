//! Line-oriented prompts with re-prompt loops.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use std::io::{BufRead, Write};

use taskrank_core::{Error, TimeFormats, parse_duration_days, validate_name};

/// Input ended in the middle of a multi-step prompt.
#[derive(Debug, thiserror::Error)]
#[error("input closed while waiting for {0}")]
pub struct InputClosed(pub String);

pub struct Prompter<R, W> {
    input: R,
    out: W,
    formats: TimeFormats,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, out: W, formats: TimeFormats) -> Self {
        Self {
            input,
            out,
            formats,
        }
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    /// One trimmed line, or `None` once input is closed.
    pub fn line(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{label}: ")?;
        self.out.flush().ok();
        let mut s = String::new();
        if self.input.read_line(&mut s)? == 0 {
            return Ok(None);
        }
        Ok(Some(s.trim().to_string()))
    }

    fn required(&mut self, label: &str) -> Result<String> {
        match self.line(label)? {
            Some(s) => Ok(s),
            None => Err(InputClosed(label.to_string()).into()),
        }
    }

    pub fn name(&mut self, label: &str) -> Result<String> {
        loop {
            let s = self.required(label)?;
            match validate_name(&s) {
                Ok(()) => return Ok(s),
                Err(e) => writeln!(self.out, "{e}")?,
            }
        }
    }

    /// Keep asking until the text matches the input pattern.
    pub fn time(&mut self, label: &str) -> Result<NaiveDateTime> {
        loop {
            let s = self.required(label)?;
            match self.formats.parse_input(&s) {
                Ok(ts) => return Ok(ts),
                Err(_) => writeln!(
                    self.out,
                    "Sorry, '{s}' could not be read as a time. Please use the format [{}] and try again.",
                    self.formats.input
                )?,
            }
        }
    }

    pub fn days(&mut self, label: &str) -> Result<Duration> {
        loop {
            let s = self.required(label)?;
            match parse_duration_days(&s) {
                Ok(span) => return Ok(span),
                Err(_) => writeln!(self.out, "Please enter a positive number of days.")?,
            }
        }
    }

    /// 1-based pick among `count` items; blank or `q` cancels with `None`.
    pub fn select(&mut self, label: &str, count: usize) -> Result<Option<usize>> {
        loop {
            let Some(s) = self.line(label)? else {
                return Ok(None);
            };
            if s.is_empty() || s.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            match parse_selection(&s, count) {
                Ok(i) => return Ok(Some(i)),
                Err(e) => writeln!(self.out, "{e}")?,
            }
        }
    }
}

/// Turn a typed 1-based number into a 0-based position.
pub fn parse_selection(text: &str, count: usize) -> taskrank_core::Result<usize> {
    let n: usize = text
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("'{}' is not a number", text.trim())))?;
    if n == 0 || n > count {
        return Err(Error::Validation(format!(
            "choose a number between 1 and {count}"
        )));
    }
    Ok(n - 1)
}

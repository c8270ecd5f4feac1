//! Error taxonomy shared by the core, the store and the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taskrank.
#[derive(Error, Debug)]
pub enum Error {
    /// Timestamp, duration or number text that does not match the expected shape.
    #[error("format error: '{input}' is not a valid {expected}")]
    Format { input: String, expected: String },

    /// A store file is missing or inaccessible.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Weights that are malformed, incomplete or produce a degenerate ranking.
    #[error("configuration error: {0}")]
    Config(String),

    /// User-supplied or data values that break an invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persisted record failed to parse; the whole load is aborted.
    #[error("log could not be parsed: {} line {line}: {reason}", path.display())]
    Corrupt {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

impl Error {
    pub fn format(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Format {
            input: input.into(),
            expected: expected.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_message_names_file_and_line() {
        let err = Error::Corrupt {
            path: PathBuf::from("task_log.csv"),
            line: 3,
            reason: "expected 6 fields, found 4".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("log could not be parsed"));
        assert!(msg.contains("task_log.csv line 3"));
    }

    #[test]
    fn format_message_quotes_input() {
        let err = Error::format("tomorrow", "timestamp (%Y-%m-%d %H:%M)");
        assert_eq!(
            err.to_string(),
            "format error: 'tomorrow' is not a valid timestamp (%Y-%m-%d %H:%M)"
        );
    }
}

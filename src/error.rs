//! Error taxonomy and server-message classification.
//!
//! [`classify_message`] turns raw diagnostic text (stderr output, or the
//! `data` field of an in-stream error record via [`parse_error`]) into a
//! typed [`Error`]. Known message shapes live in a static pattern table;
//! new classifications are added to the table, not at call sites.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::record::Record;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The child process could not be started at all.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Stream plumbing failed after the child was already running.
    #[error("i/o error talking to child process: {0}")]
    Io(#[from] std::io::Error),

    /// The record stream stopped decoding partway through. Records decoded
    /// before the failure are preserved in `partial`; the tool interleaves
    /// diagnostic records ahead of some failures (expired credentials, for
    /// one) and callers need those to see what actually went wrong.
    #[error("malformed record stream at byte {offset}: {detail}")]
    Decode {
        detail: String,
        offset: usize,
        snippet: String,
        partial: Vec<Record>,
    },

    /// The child exited non-zero with clean streams. The fully decoded
    /// records ride along for interpretation.
    #[error("p4 exited with status {code}")]
    Exit { code: i32, records: Vec<Record> },

    /// A tool-reported error that matched no known pattern, tagged for
    /// log grep-ability.
    #[error("P4Error -> {0}")]
    Server(String),

    /// The server rejected a depot/client path it does not know about.
    #[error("No such area '{path}', please check your path")]
    NoSuchArea { path: String },

    /// An error record without the conventional `data` field.
    #[error("error record carried no 'data' field")]
    MalformedErrorRecord,
}

type MessagePattern = (Regex, fn(&Captures<'_>) -> Error);

// One entry per known server message shape. Capture group 1 is whatever
// the constructor needs to pull out of the text.
static KNOWN_MESSAGES: LazyLock<Vec<MessagePattern>> = LazyLock::new(|| {
    vec![(
        Regex::new(r"^(.*?) - must refer to client").expect("valid pattern"),
        |caps| Error::NoSuchArea {
            path: caps[1].to_string(),
        },
    )]
});

/// Classify a raw server diagnostic message into a typed error.
///
/// Messages matching no known pattern come back verbatim as
/// [`Error::Server`].
pub fn classify_message(message: &str) -> Error {
    for (pattern, build) in KNOWN_MESSAGES.iter() {
        if let Some(caps) = pattern.captures(message) {
            return build(&caps);
        }
    }
    Error::Server(message.to_string())
}

/// Turn a decoded error record into a typed error.
///
/// The tool reports errors as records whose `data` field holds the
/// human-readable message; that text is fed through [`classify_message`].
pub fn parse_error(record: &Record) -> Error {
    match record.get("data") {
        Some(data) => classify_message(data),
        None => Error::MalformedErrorRecord,
    }
}

//! Thin client for the Perforce Helix Core command line.
//!
//! Shells out to `p4` (assumed resolvable on `PATH` unless overridden via
//! [`P4::with_binary`]) and parses its machine-readable output. Query
//! commands run with the `-Mj -ztag` global options, which make the server
//! reply with one self-delimiting JSON dictionary per result on stdout;
//! those are decoded into flat string-to-string [`Record`]s.
//!
//! Three call shapes:
//!   - [`P4::run`]: run a query command, get decoded records back.
//!   - [`P4::save`]: format a spec, pipe it to `<cmd> -i` on stdin, get
//!     decoded records back.
//!   - [`P4::save_text`]: same, but plain output mode and raw text back.
//!
//! Each call spawns exactly one child process and drives it to completion.
//! Connection parameters (`-p` / `-u` / `-c`) are immutable on the [`P4`]
//! handle; anything unset falls through to the tool's own ambient
//! configuration.

pub mod client;
pub mod error;
pub mod process;
pub mod record;
pub mod spec;

pub use client::{P4, Runner};
pub use error::{Error, Result, classify_message, parse_error};
pub use process::CmdOutput;
pub use record::{Record, decode_records};
pub use spec::format_spec;

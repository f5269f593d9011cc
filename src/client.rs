//! The `P4` client handle and its run/save operations.
//!
//! The handle holds the three optional connection parameters (server
//! address, user, client workspace) plus the binary name, all immutable
//! after construction. Every operation builds a fresh argument vector —
//! global options first, then the subcommand — spawns one child, and
//! interprets its captured streams.

use std::collections::HashMap;
use std::future::Future;

use tracing::{debug, warn};

use crate::error::{Error, Result, classify_message};
use crate::process::{CmdOutput, run_capture};
use crate::record::{Record, decode_records};
use crate::spec::format_spec;

const DEFAULT_BINARY: &str = "p4";

// Global flags selecting the machine-readable (JSON dictionary) output
// mode; the "marshalled" option profile.
const MARSHAL_FLAGS: [&str; 2] = ["-Mj", "-ztag"];

/// Anything that can execute one command invocation and hand back decoded
/// records. The seam for testing command-level logic against canned
/// records instead of a real child process; [`P4`] is the process-backed
/// implementation.
pub trait Runner {
    fn run(&self, args: &[&str]) -> impl Future<Output = Result<Vec<Record>>> + Send;
}

/// Client handle for the external tool.
///
/// Unset connection parameters are omitted from the argument vector
/// entirely, leaving them to the tool's ambient configuration; this
/// client assumes no defaults of its own.
#[derive(Debug, Clone)]
pub struct P4 {
    port: String,
    user: String,
    client: String,
    binary: String,
}

impl Default for P4 {
    fn default() -> Self {
        Self {
            port: String::new(),
            user: String::new(),
            client: String::new(),
            binary: DEFAULT_BINARY.to_string(),
        }
    }
}

impl P4 {
    /// Handle with no connection parameters of its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle with explicit connection parameters. Empty strings behave
    /// like [`P4::new`] for that field.
    pub fn with_connection(
        port: impl Into<String>,
        user: impl Into<String>,
        client: impl Into<String>,
    ) -> Self {
        Self {
            port: port.into(),
            user: user.into(),
            client: client.into(),
            binary: DEFAULT_BINARY.to_string(),
        }
    }

    /// Override the executable name or path. Tests point this at a
    /// stand-in tool.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Run a query command and decode its record stream.
    ///
    /// Any stderr output is a hard failure and takes precedence over
    /// whatever landed on stdout. A clean record stream from a non-zero
    /// exit comes back as [`Error::Exit`] with the records riding along.
    pub async fn run(&self, args: &[&str]) -> Result<Vec<Record>> {
        let argv = self.build_argv(self.marshal_opts(), args);
        let output = run_capture(&self.binary, &argv, None).await?;
        interpret_records(output)
    }

    /// Save a spec: format `fields`, pipe the text to `<spec_name> -i` on
    /// stdin, and decode the record stream that comes back.
    pub async fn save(
        &self,
        spec_name: &str,
        fields: &HashMap<String, String>,
        args: &[&str],
    ) -> Result<Vec<Record>> {
        let argv = self.save_argv(self.marshal_opts(), spec_name, args);
        let spec = format_spec(fields);
        debug!(spec_name, bytes = spec.len(), "piping spec to child stdin");
        let output = run_capture(&self.binary, &argv, Some(spec.as_bytes())).await?;
        interpret_records(output)
    }

    /// Like [`P4::save`] but with the plain output mode, returning the raw
    /// stdout text. Any stderr output means an error and no text.
    pub async fn save_text(
        &self,
        spec_name: &str,
        fields: &HashMap<String, String>,
        args: &[&str],
    ) -> Result<String> {
        let argv = self.save_argv(self.connection_opts(), spec_name, args);
        let spec = format_spec(fields);
        debug!(spec_name, bytes = spec.len(), "piping spec to child stdin");
        let output = run_capture(&self.binary, &argv, Some(spec.as_bytes())).await?;

        let stderr = output.stderr_text();
        if !stderr.trim().is_empty() {
            return Err(classify_message(stderr.trim()));
        }
        if !output.status.success() {
            // Raw-text mode has no structured channel for the status, and
            // the tool reports real failures on stderr anyway.
            warn!(status = ?output.status, "child exited non-zero with empty stderr");
        }
        Ok(output.stdout_text())
    }

    /// Run with the caller's arguments verbatim (no option profiles, no
    /// connection parameters) and return the combined captured output
    /// regardless of exit status.
    pub async fn run_raw(&self, args: &[&str]) -> Result<Vec<u8>> {
        let argv: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let output = run_capture(&self.binary, &argv, None).await?;
        let mut bytes = output.stdout;
        bytes.extend_from_slice(&output.stderr);
        Ok(bytes)
    }

    // Connection options only, for commands whose output is read as text.
    fn connection_opts(&self) -> Vec<String> {
        let mut opts = Vec::new();
        for (flag, value) in [
            ("-p", &self.port),
            ("-u", &self.user),
            ("-c", &self.client),
        ] {
            if !value.is_empty() {
                opts.push(flag.to_string());
                opts.push(value.clone());
            }
        }
        opts
    }

    // Machine-readable output flags plus connection options.
    fn marshal_opts(&self) -> Vec<String> {
        let mut opts: Vec<String> = MARSHAL_FLAGS.iter().map(|f| f.to_string()).collect();
        opts.extend(self.connection_opts());
        opts
    }

    fn build_argv(&self, mut opts: Vec<String>, args: &[&str]) -> Vec<String> {
        opts.extend(args.iter().map(|a| a.to_string()));
        opts
    }

    // Save-style invocations read the spec from stdin: `<spec_name> -i`.
    fn save_argv(&self, opts: Vec<String>, spec_name: &str, extra: &[&str]) -> Vec<String> {
        let mut argv = opts;
        argv.push(spec_name.to_string());
        argv.push("-i".to_string());
        argv.extend(extra.iter().map(|a| a.to_string()));
        argv
    }
}

impl Runner for P4 {
    async fn run(&self, args: &[&str]) -> Result<Vec<Record>> {
        P4::run(self, args).await
    }
}

/// Shared stderr / decode / exit-status interpretation for the
/// record-producing operations.
fn interpret_records(output: CmdOutput) -> Result<Vec<Record>> {
    let stderr = output.stderr_text();
    if !stderr.trim().is_empty() {
        return Err(classify_message(stderr.trim()));
    }
    let records = decode_records(&output.stdout)?;
    if !output.status.success() {
        return Err(Error::Exit {
            code: output.status.code().unwrap_or(-1),
            records,
        });
    }
    Ok(records)
}

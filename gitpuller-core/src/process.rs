//! Process execution for local git commands
//!
//! A [`ProcessRunner`] runs one command in a working directory and reports
//! what happened. It knows nothing about git: exit codes, timeouts and
//! captured output are returned as data, and only a failure to start the
//! process at all is an error.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{Error, Result};

/// How long to wait for output readers after a normal exit
const READER_GRACE: Duration = Duration::from_secs(5);

/// How long to wait for output readers after killing a timed-out child
const KILLED_READER_GRACE: Duration = Duration::from_millis(500);

/// A program together with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl Invocation {
    /// Create an invocation with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Outcome of a single process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Everything the process wrote to stdout
    pub stdout: String,
    /// Everything the process wrote to stderr
    pub stderr: String,
    /// Exit code, or -1 when killed or terminated by a signal
    pub exit_code: i32,
    /// The process was killed because it exceeded its timeout
    pub timed_out: bool,
}

impl CommandResult {
    /// Whether the command succeeded.
    ///
    /// The exit code is authoritative: git writes progress and hints to
    /// stderr even when it succeeds.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// A one-line description of why the command failed
    pub fn failure_message(&self) -> String {
        if self.timed_out {
            return "command timed out".to_string();
        }

        let detail = [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("no output");

        format!("exit code {}: {}", self.exit_code, detail)
    }
}

/// Capability to run a local command
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` in `workdir`, killing it after `timeout`
    async fn run(
        &self,
        invocation: &Invocation,
        workdir: &Path,
        timeout: Duration,
    ) -> Result<CommandResult>;
}

/// Runner backed by real child processes
#[derive(Debug, Clone)]
pub struct SystemRunner {
    env: Vec<(String, String)>,
}

impl SystemRunner {
    /// Create a runner that disables git's interactive prompts
    pub fn new() -> Self {
        Self {
            env: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        workdir: &Path,
        timeout: Duration,
    ) -> Result<CommandResult> {
        if !workdir.is_dir() {
            return Err(Error::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("working directory does not exist: {}", workdir.display()),
                ),
            });
        }

        debug!(command = %invocation, workdir = %workdir.display(), "Running command");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));

        let readers: Vec<JoinHandle<()>> = [
            child
                .stdout
                .take()
                .map(|out| tokio::spawn(drain(out, Arc::clone(&stdout_buf)))),
            child
                .stderr
                .take()
                .map(|err| tokio::spawn(drain(err, Arc::clone(&stderr_buf)))),
        ]
        .into_iter()
        .flatten()
        .collect();

        let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => (status.map_err(Error::Io)?.code().unwrap_or(-1), false),
            Err(_) => {
                warn!(
                    command = %invocation,
                    workdir = %workdir.display(),
                    timeout_secs = timeout.as_secs_f64(),
                    "Command timed out, killing it"
                );
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "Failed to kill timed-out child");
                }
                (-1, true)
            }
        };

        // A killed child can leave grandchildren holding the pipes open.
        let grace = if timed_out {
            KILLED_READER_GRACE
        } else {
            READER_GRACE
        };
        for reader in readers {
            let abort = reader.abort_handle();
            if tokio::time::timeout(grace, reader).await.is_err() {
                abort.abort();
            }
        }

        let result = CommandResult {
            stdout: snapshot(&stdout_buf),
            stderr: snapshot(&stderr_buf),
            exit_code,
            timed_out,
        };

        debug!(
            command = %invocation,
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            "Command finished"
        );

        Ok(result)
    }
}

/// Copy a stream into a shared buffer as it arrives
async fn drain<R: AsyncRead + Unpin>(mut reader: R, buf: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut buf) = buf.lock() {
                    buf.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }
}

fn snapshot(buf: &Mutex<Vec<u8>>) -> String {
    buf.lock()
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default()
}

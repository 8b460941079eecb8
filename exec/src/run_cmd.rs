//! Subprocess execution with line-streamed output.
//!
//! [`RunCmd`] spawns a program with piped stdout and stderr, drains each
//! stream on its own thread (so a full pipe buffer can never block the
//! child) and hands every line to a caller-provided sink. Without a sink the
//! stream is inherited from the current process.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use gblibx_exec::RunCmd;
//!
//! let lines = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&lines);
//! let status = RunCmd::from_command_line("ls -1 /")
//!     .stdout(move |line| sink.lock().unwrap().push(line.to_string()))
//!     .timeout(Duration::from_secs(5))
//!     .run()
//!     .unwrap();
//! assert!(status.success());
//! ```

use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Shell used by [`RunCmd::shell`].
pub const SHELL: &str = "/bin/sh";

/// Reported by [`RunStatus::exit_code`] when the child was killed by a
/// signal.
pub const NO_EXIT_CODE: i32 = -1;

/// Receives one output line at a time, without the trailing newline.
pub type LineSink = Box<dyn FnMut(&str) + Send + 'static>;

/// Failures while running a command.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("empty command")]
    EmptyCommand,
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} timed out after {}ms", .timeout.as_millis())]
    TimedOut { program: String, timeout: Duration },
}

/// How a finished command exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl RunStatus {
    fn from_exit(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }

    /// Normal exit with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// The exit code, or [`NO_EXIT_CODE`].
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(NO_EXIT_CODE)
    }
}

/// A command to run, configured builder-style.
pub struct RunCmd {
    argv: Vec<String>,
    stdout: Option<LineSink>,
    stderr: Option<LineSink>,
    timeout: Option<Duration>,
    current_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl RunCmd {
    /// Runs `argv[0]` with the remaining elements as arguments.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            stdout: None,
            stderr: None,
            timeout: None,
            current_dir: None,
            env: Vec::new(),
        }
    }

    /// Splits `command` on whitespace. No quoting is honored; use
    /// [`RunCmd::shell`] for that.
    pub fn from_command_line(command: &str) -> Self {
        Self::new(command.split_whitespace())
    }

    /// Runs `command` through `/bin/sh -c`.
    pub fn shell(command: &str) -> Self {
        Self::new([SHELL, "-c", command])
    }

    /// Sends stdout lines to `sink`.
    pub fn stdout(mut self, sink: impl FnMut(&str) + Send + 'static) -> Self {
        self.stdout = Some(Box::new(sink));
        self
    }

    /// Sends stderr lines to `sink`.
    pub fn stderr(mut self, sink: impl FnMut(&str) + Send + 'static) -> Self {
        self.stderr = Some(Box::new(sink));
        self
    }

    /// Kills the child if it has not exited after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The command line, arguments joined by a space.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Spawns the command and waits for it and both output drains.
    ///
    /// On timeout only the direct child is killed and reaped. Drains are not
    /// awaited then, so sinks may still see lines from processes it started.
    ///
    /// # Errors
    ///
    /// [`RunError::EmptyCommand`] without a program, [`RunError::Spawn`] when
    /// it cannot be started, [`RunError::TimedOut`] after killing a child
    /// that outlived the timeout.
    pub fn run(self) -> Result<RunStatus, RunError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(RunError::EmptyCommand);
        };
        let program = program.clone();

        let mut command = Command::new(&program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdio_for(self.stdout.is_some()))
            .stderr(stdio_for(self.stderr.is_some()));
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }

        debug!(command = %self.command_line(), "spawning command");
        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: program.clone(),
            source,
        })?;

        let drains = [
            child
                .stdout
                .take()
                .zip(self.stdout)
                .map(|(pipe, sink)| drain_lines(pipe, sink)),
            child
                .stderr
                .take()
                .zip(self.stderr)
                .map(|(pipe, sink)| drain_lines(pipe, sink)),
        ];

        let waited = wait_for(&mut child, self.timeout);
        if matches!(waited, Ok(Some(_))) {
            for drain in drains.into_iter().flatten() {
                if drain.join().is_err() {
                    warn!(%program, "output sink panicked");
                }
            }
        } else {
            let _ = child.kill();
            let _ = child.wait();
            // A grandchild may still hold the pipes open; leave the drains
            // detached so they finish whenever it exits.
            drop(drains);
        }

        match waited {
            Ok(Some(status)) => {
                let status = RunStatus::from_exit(status);
                debug!(%program, code = ?status.code, "command finished");
                Ok(status)
            }
            Ok(None) => {
                let timeout = self.timeout.unwrap_or_default();
                let timeout_ms = timeout.as_millis() as u64;
                debug!(%program, timeout_ms, "command timed out");
                Err(RunError::TimedOut { program, timeout })
            }
            Err(source) => Err(RunError::Wait { program, source }),
        }
    }
}

fn stdio_for(piped: bool) -> Stdio {
    if piped {
        Stdio::piped()
    } else {
        Stdio::inherit()
    }
}

/// `Ok(None)` means the timeout elapsed first.
fn wait_for(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    match timeout {
        Some(timeout) => child.wait_timeout(timeout),
        None => child.wait().map(Some),
    }
}

fn drain_lines<R>(pipe: R, mut sink: LineSink) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    sink(line.trim_end_matches(['\n', '\r']));
                }
                Err(e) => {
                    debug!(error = %e, "failed to read command output");
                    break;
                }
            }
        }
    })
}

/// Runs `command` (whitespace-split) with inherited output and returns its
/// exit code.
pub fn run_command(command: &str) -> Result<i32, RunError> {
    RunCmd::from_command_line(command)
        .run()
        .map(|status| status.exit_code())
}

/// Runs `command` (whitespace-split) and returns its stdout lines joined by
/// `\n`. Stderr is inherited.
pub fn run_command_stdout(command: &str) -> Result<String, RunError> {
    let (tx, rx) = std::sync::mpsc::channel();
    RunCmd::from_command_line(command)
        .stdout(move |line| {
            let _ = tx.send(line.to_string());
        })
        .run()?;
    Ok(rx.into_iter().collect::<Vec<_>>().join("\n"))
}

/// Runs `command` through the shell; `true` on a normal exit with status 0.
pub fn run_shell(command: &str) -> bool {
    match RunCmd::shell(command).run() {
        Ok(status) => status.success(),
        Err(e) => {
            warn!(%command, error = %e, "shell command failed");
            false
        }
    }
}

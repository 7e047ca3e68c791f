//! Process runner
//!
//! Runs one external program against a test case. The input is written to a
//! scratch file and attached as stdin; stdout and stderr go to scratch files
//! that are read back once the process exits. Every invocation truncates the
//! files it uses, so nothing from an earlier run can be observed.

use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, warn};

const INPUT_FILE: &str = "input";
const OUTPUT_FILE: &str = "output";
const STDERR_FILE: &str = "stderr";

/// Poll interval while waiting on a process with a timeout
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// An external program: executable path plus fixed leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSpec {
    pub path: PathBuf,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl ProgramSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Short name used in reports (`./standard` -> `standard`).
    ///
    /// Interpreted programs such as `python3 sol.py` are named after their
    /// script, i.e. the first argument when it is not a flag.
    pub fn label(&self) -> String {
        let named = match self.args.first() {
            Some(script) if !script.starts_with('-') => Path::new(script),
            _ => self.path.as_path(),
        };
        named
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| named.display().to_string())
    }

    /// Printable command line for reproducing an invocation by hand
    pub fn command_line(&self, extra_args: &[String]) -> String {
        std::iter::once(self.path.display().to_string())
            .chain(self.args.iter().cloned())
            .chain(extra_args.iter().cloned())
            .map(|part| shell_quote(&part))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&str> for ProgramSpec {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

fn shell_quote(part: &str) -> String {
    let plain = !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+:,@%".contains(c));
    if plain {
        part.to_string()
    } else {
        format!("'{}'", part.replace('\'', r"'\''"))
    }
}

/// How a program terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitOutcome {
    Success,
    Failed { code: Option<i32> },
    Signaled { signal: i32 },
    TimedOut { after_ms: u64 },
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return ExitOutcome::Success;
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled { signal };
            }
        }
        ExitOutcome::Failed {
            code: status.code(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Success => write!(f, "success"),
            ExitOutcome::Failed { code: Some(code) } => write!(f, "exit code {code}"),
            ExitOutcome::Failed { code: None } => write!(f, "abnormal exit"),
            ExitOutcome::Signaled { signal } => write!(f, "killed by signal {signal}"),
            ExitOutcome::TimedOut { after_ms } => write!(f, "timed out after {after_ms}ms"),
        }
    }
}

/// Captured result of one program run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub outcome: ExitOutcome,
    pub stdout: String,
    pub stderr: String,
    pub elapsed_ms: u64,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Runs external programs.
///
/// `Err` is reserved for harness faults (spawn or scratch I/O failures). A
/// program that exits badly is reported through [`ExecutionResult::outcome`].
pub trait Executor {
    fn execute(
        &mut self,
        program: &ProgramSpec,
        extra_args: &[String],
        stdin: Option<&str>,
    ) -> Result<ExecutionResult>;
}

/// Executor backed by real subprocesses and a private scratch directory
#[derive(Debug)]
pub struct ProcessRunner {
    scratch: TempDir,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Runner with a scratch directory under the system temp dir
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let scratch = scratch_builder()
            .tempdir()
            .map_err(|e| HarnessError::io(std::env::temp_dir(), e))?;
        Ok(Self { scratch, timeout })
    }

    /// Runner with a scratch directory under `parent`
    pub fn in_dir(parent: &Path, timeout: Option<Duration>) -> Result<Self> {
        let scratch = scratch_builder()
            .tempdir_in(parent)
            .map_err(|e| HarnessError::io(parent, e))?;
        Ok(Self { scratch, timeout })
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn scratch_file(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }

    fn wait(&self, child: &mut Child, program: &ProgramSpec, start: Instant) -> Result<ExitOutcome> {
        let wait_error = |e| HarnessError::io(&program.path, e);

        let Some(limit) = self.timeout else {
            return child.wait().map(ExitOutcome::from_status).map_err(wait_error);
        };

        loop {
            if let Some(status) = child.try_wait().map_err(wait_error)? {
                return Ok(ExitOutcome::from_status(status));
            }
            if start.elapsed() >= limit {
                warn!(
                    "{} exceeded {}ms, killing it",
                    program.label(),
                    limit.as_millis()
                );
                let _ = child.kill();
                let _ = child.wait();
                return Ok(ExitOutcome::TimedOut {
                    after_ms: limit.as_millis() as u64,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

fn scratch_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("approx-stress-");
    builder
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| HarnessError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl Executor for ProcessRunner {
    fn execute(
        &mut self,
        program: &ProgramSpec,
        extra_args: &[String],
        stdin: Option<&str>,
    ) -> Result<ExecutionResult> {
        let input_path = self.scratch_file(INPUT_FILE);
        let output_path = self.scratch_file(OUTPUT_FILE);
        let stderr_path = self.scratch_file(STDERR_FILE);

        let stdin = match stdin {
            Some(text) => {
                fs::write(&input_path, text).map_err(|e| HarnessError::io(&input_path, e))?;
                let file = File::open(&input_path).map_err(|e| HarnessError::io(&input_path, e))?;
                Stdio::from(file)
            }
            None => Stdio::null(),
        };
        let stdout = File::create(&output_path).map_err(|e| HarnessError::io(&output_path, e))?;
        let stderr = File::create(&stderr_path).map_err(|e| HarnessError::io(&stderr_path, e))?;

        debug!("Running {}", program.command_line(extra_args));

        let start = Instant::now();
        let mut child = Command::new(&program.path)
            .args(&program.args)
            .args(extra_args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: program.path.clone(),
                source,
            })?;

        let outcome = self.wait(&mut child, program, start)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        debug!("{} finished: {} in {}ms", program.label(), outcome, elapsed_ms);

        Ok(ExecutionResult {
            outcome,
            stdout: read_lossy(&output_path)?,
            stderr: read_lossy(&stderr_path)?,
            elapsed_ms,
        })
    }
}

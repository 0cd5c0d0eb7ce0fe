//! External d8 invocation with code-printing flags.
//!
//! The compiler is a black box: it takes a source file plus a fixed flag set
//! and either prints disassembly text to stdout or fails. Each [`Invoker`]
//! carries its own backend identity and executable path so invokers for
//! different targets can coexist in one process.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

/// Flags forcing natives syntax and disassembly printing. The cost model
/// depends on `--code-comments` for block-boundary markers.
pub const D8_FLAGS: [&str; 3] = ["--allow-natives-syntax", "--print-code", "--code-comments"];

/// Poll interval for the bounded wait.
const WAIT_POLL: Duration = Duration::from_millis(20);

/// Instruction-set backend under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    Riscv64,
    Mips64el,
}

impl Backend {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Riscv64 => "riscv64",
            Self::Mips64el => "mips64el",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Invocation errors.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("failed to spawn {backend} d8 ({path}): {source}")]
    Spawn {
        backend: Backend,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{backend} d8 exceeded {timeout:?} and was killed")]
    Timeout { backend: Backend, timeout: Duration },
    #[error("{backend} d8 failed ({status}): {stderr}")]
    Failed {
        backend: Backend,
        status: ExitStatus,
        stderr: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvokeError {
    /// Whether this is the backend itself failing (crash / non-zero exit),
    /// as opposed to a harness-side problem.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, InvokeError>;

/// One backend's d8 executable plus invocation policy.
#[derive(Clone, Debug)]
pub struct Invoker {
    backend: Backend,
    d8: PathBuf,
    timeout: Option<Duration>,
}

impl Invoker {
    #[must_use]
    pub fn new(backend: Backend, d8: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            d8: d8.into(),
            timeout: None,
        }
    }

    /// Bound each invocation; a hung compile is killed rather than stalling
    /// the whole search.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn backend(&self) -> Backend {
        self.backend
    }

    /// Compile `source` and return the raw disassembly text.
    pub fn disassemble(&self, source: &Path) -> Result<String> {
        debug!(backend = %self.backend, source = %source.display(), "invoking d8");

        let mut cmd = Command::new(&self.d8);
        cmd.args(D8_FLAGS)
            .arg(source)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match self.timeout {
            Some(timeout) => self.output_with_timeout(&mut cmd, timeout)?,
            None => cmd.output().map_err(|source| InvokeError::Spawn {
                backend: self.backend,
                path: self.d8.clone(),
                source,
            })?,
        };

        if !output.status.success() {
            return Err(InvokeError::Failed {
                backend: self.backend,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run the command, killing the child once the deadline passes.
    ///
    /// Stdout and stderr are drained on their own threads while we wait:
    /// a disassembly dump is far larger than a pipe buffer, and a child
    /// blocked on a full pipe would idle into the deadline.
    fn output_with_timeout(&self, cmd: &mut Command, timeout: Duration) -> Result<Output> {
        let mut child = cmd.spawn().map_err(|source| InvokeError::Spawn {
            backend: self.backend,
            path: self.d8.clone(),
            source,
        })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() >= timeout {
                let _ = child.kill();
                // Killing closes the pipes, so the drain threads finish on
                // their own.
                let _ = child.wait();
                return Err(InvokeError::Timeout {
                    backend: self.backend,
                    timeout,
                });
            }
            thread::sleep(WAIT_POLL);
        };

        Ok(Output {
            status,
            stdout: stdout.map_or_else(Vec::new, collect),
            stderr: stderr.map_or_else(Vec::new, collect),
        })
    }

    /// Exact command line reproducing this invocation.
    #[must_use]
    pub fn repro_command(&self, source: &Path) -> String {
        let mut parts = vec![self.d8.display().to_string()];
        parts.extend(D8_FLAGS.iter().map(ToString::to_string));
        parts.push(source.display().to_string());
        parts.join(" ")
    }
}

/// Read a pipe to EOF on a dedicated thread.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: thread::JoinHandle<Vec<u8>>) -> Vec<u8> {
    handle.join().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repro_command_carries_fixed_flags() {
        let invoker = Invoker::new(Backend::Riscv64, "/opt/v8/d8");
        let cmd = invoker.repro_command(Path::new("case-abc.js"));
        assert_eq!(
            cmd,
            "/opt/v8/d8 --allow-natives-syntax --print-code --code-comments case-abc.js"
        );
    }

    #[test]
    fn test_spawn_error_names_backend_and_path() {
        let invoker = Invoker::new(Backend::Mips64el, "/nonexistent/d8");
        let err = invoker.disassemble(Path::new("x.js")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("mips64el"), "{msg}");
        assert!(msg.contains("/nonexistent/d8"), "{msg}");
        assert!(!err.is_backend_failure());
    }

    #[test]
    fn test_nonzero_exit_is_backend_failure() {
        // `false` stands in for a crashing d8.
        let invoker = Invoker::new(Backend::Riscv64, "false");
        let err = invoker.disassemble(Path::new("x.js")).unwrap_err();
        assert!(err.is_backend_failure(), "{err}");
    }

    #[test]
    fn test_fixed_flags_passed_and_stdout_captured() {
        // `echo` prints its argument vector back, so the captured stdout is
        // exactly the command line we claim to run.
        let invoker = Invoker::new(Backend::Riscv64, "echo");
        let out = invoker.disassemble(Path::new("case-x.js")).unwrap();
        assert_eq!(
            out.trim_end(),
            "--allow-natives-syntax --print-code --code-comments case-x.js"
        );
    }

    #[test]
    fn test_verbose_child_is_drained_not_timed_out() {
        // Writes an order of magnitude more than a pipe buffer and exits;
        // the bounded wait must consume it instead of letting the child
        // block on a full pipe until the deadline.
        let invoker =
            Invoker::new(Backend::Riscv64, "head").with_timeout(Duration::from_secs(5));
        let mut cmd = Command::new("head");
        cmd.args(["-c", "600000", "/dev/zero"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let out = invoker
            .output_with_timeout(&mut cmd, Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.stdout.len(), 600_000);
        assert!(start.elapsed() < Duration::from_secs(2), "child was not drained");
    }

    #[test]
    fn test_timeout_kills_hung_process() {
        let invoker =
            Invoker::new(Backend::Riscv64, "sleep").with_timeout(Duration::from_millis(100));
        let mut cmd = Command::new("sleep");
        cmd.arg("10").stdout(Stdio::piped()).stderr(Stdio::piped());

        let start = Instant::now();
        let err = invoker
            .output_with_timeout(&mut cmd, Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, InvokeError::Timeout { .. }), "{err}");
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}

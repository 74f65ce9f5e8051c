//! Subprocess-based runner for terraform and the bosh CLI.
//!
//! stdout is captured for parsing (and echoed when streaming), stderr is
//! forwarded line by line to our own stderr while also being captured.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::config::Invocation;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult};

/// CLI runner options.
#[derive(Debug, Clone, Default)]
pub struct CliRunnerOptions {
    /// Echo stdout of every invocation, not only streamed ones
    pub debug: bool,
}

impl CliRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }
}

/// Runner that executes a program as a child process.
#[derive(Debug, Clone)]
pub struct CliRunner {
    program: String,
    options: CliRunnerOptions,
}

impl CliRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            options: CliRunnerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CliRunnerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Execute a command and capture output with streaming.
    fn execute(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.workdir {
            cmd.current_dir(dir);
        }
        cmd.envs(&invocation.env);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!("Executing: {}", invocation.display(&self.program));

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RunnerError::ToolNotFound(self.program.clone())
            } else {
                RunnerError::SpawnFailed {
                    program: self.program.clone(),
                    source: e,
                }
            }
        })?;

        let echo = invocation.stream || self.options.debug;
        let stdout_handle = child
            .stdout
            .take()
            .map(|stdout| spawn_reader(stdout, echo, false));
        let stderr_handle = child
            .stderr
            .take()
            .map(|stderr| spawn_reader(stderr, true, true));

        let started = Instant::now();
        let status = child.wait().map_err(|e| RunnerError::WaitFailed {
            program: self.program.clone(),
            message: e.to_string(),
        })?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let stdout = join_reader(stdout_handle);
        let stderr = join_reader(stderr_handle);
        let exit_code = status.code().unwrap_or(-1);

        if exit_code == 0 {
            info!("{} completed in {}ms", self.program, duration_ms);
        } else {
            error!(
                "{} exited with code {} after {}ms",
                self.program, exit_code, duration_ms
            );
        }

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            duration_ms,
        })
    }
}

fn spawn_reader<R>(source: R, echo: bool, to_stderr: bool) -> JoinHandle<String>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let reader = BufReader::new(source);
        let mut output = String::new();
        for line in reader.lines().map_while(Result::ok) {
            if echo {
                if to_stderr {
                    eprintln!("{}", line);
                } else {
                    println!("{}", line);
                }
            }
            output.push_str(&line);
            output.push('\n');
        }
        output
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[async_trait]
impl CommandRunner for CliRunner {
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult> {
        let runner = self.clone();
        let invocation = invocation.clone();
        let program = self.program.clone();
        tokio::task::spawn_blocking(move || runner.execute(&invocation))
            .await
            .map_err(|e| RunnerError::WaitFailed {
                program,
                message: e.to_string(),
            })?
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let runner = CliRunner::new("sh");
        let result = runner
            .run(&Invocation::new(["-c", "echo hello; echo oops >&2; exit 3"]))
            .await
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "oops\n");
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_runs_in_workdir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "x").unwrap();

        let runner = CliRunner::new("ls");
        let result = runner
            .run(&Invocation::default().workdir(dir.path()))
            .await
            .unwrap();

        assert_eq!(result.stdout.trim(), "marker");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let runner = CliRunner::new("bbl-definitely-not-installed");
        let err = runner.run(&Invocation::new(["version"])).await.unwrap_err();
        assert!(matches!(err, RunnerError::ToolNotFound(_)));
    }
}

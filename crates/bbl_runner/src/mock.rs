//! Mock command runner for testing.
//!
//! Provides a configurable mock implementation of the [`CommandRunner`] trait
//! for use in unit tests without requiring terraform or the bosh CLI.
//! Responses are queued per subcommand and can write files into the
//! invocation's working directory, which is how tests simulate a tool that
//! leaves a (possibly partial) state file behind.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::Invocation;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult};

/// Predefined mock response for an invocation.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Files written before the response is returned, relative to the workdir
    pub files: Vec<(PathBuf, String)>,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    /// Write `contents` to `path` when this response is served.
    pub fn writes_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.push((path.into(), contents.into()));
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl CapturedCall {
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Value following `flag` in the arguments.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Every value following an occurrence of `flag`, in order.
    pub fn flag_values(&self, flag: &str) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|w| w[0] == flag)
            .map(|w| w[1].as_str())
            .collect()
    }
}

/// Mock command runner for testing.
///
/// Each subcommand has a queue of responses. The last queued response keeps
/// being served once the others are used up; subcommands without responses
/// succeed with empty output.
#[derive(Clone, Default)]
pub struct MockRunner {
    responses: Arc<RwLock<HashMap<String, VecDeque<MockResponse>>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the given subcommand.
    pub fn respond(self, subcommand: impl Into<String>, response: MockResponse) -> Self {
        self.responses
            .write()
            .entry(subcommand.into())
            .or_default()
            .push_back(response);
        self
    }

    /// Make every invocation fail to start.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Subcommands of all calls, in order.
    pub fn subcommands(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .filter_map(|c| c.subcommand().map(str::to_string))
            .collect()
    }

    /// Get calls to a specific subcommand.
    pub fn calls_for(&self, subcommand: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.subcommand() == Some(subcommand))
            .cloned()
            .collect()
    }

    fn next_response(&self, subcommand: &str) -> MockResponse {
        let mut responses = self.responses.write();
        match responses.get_mut(subcommand) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => MockResponse::default(),
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult> {
        self.captured_calls.write().push(CapturedCall {
            args: invocation.args.clone(),
            workdir: invocation.workdir.clone(),
            env: invocation.env.clone(),
        });

        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::Simulated(msg));
        }

        let response = self.next_response(invocation.subcommand().unwrap_or_default());
        for (path, contents) in &response.files {
            let target = match &invocation.workdir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path.clone(),
            };
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(target, contents)?;
        }

        Ok(ExecutionResult {
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            duration_ms: 1,
        })
    }
}

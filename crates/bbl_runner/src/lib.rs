//! # bbl_runner
//!
//! External tool execution for bbl.
//!
//! Every interaction with `terraform` and the `bosh` CLI goes through the
//! [`CommandRunner`] trait defined here, so the executors built on top of it
//! can be exercised against a [`MockRunner`] in tests.
//!
//! # Features
//!
//! - **CLI Runner**: blocking subprocess execution with stdout capture and
//!   stderr forwarding
//! - **Run Outcomes**: [`RunOutcome`] separates completed runs from failed runs
//!   that still produced a partial state
//! - **File Port**: [`FileIo`] abstracts the working-directory writes
//! - **Mock Runner**: for testing without the real tools installed
//!
//! # Example
//!
//! ```rust,no_run
//! use bbl_runner::{CliRunner, CommandRunner, Invocation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let terraform = CliRunner::new("terraform");
//!     let result = terraform.run(&Invocation::new(["version"])).await?;
//!     println!("{}", result.stdout);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod mock;
pub mod outcome;
pub mod runner;
pub mod version;

pub use cli::{CliRunner, CliRunnerOptions};
pub use config::Invocation;
pub use error::{ErrorList, RunnerError, RunnerResult};
pub use fs::{FileIo, LocalFs};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use outcome::{RunOutcome, ToolFailure};
pub use runner::{CommandRunner, ExecutionResult};
pub use version::{extract_version, version_at_least};

//! # swift-lambda-sam
//!
//! Async driver for the AWS SAM workflow of Swift Lambda projects.
//!
//! Every external tool (`sam`, `docker`, `git`, `aws`) is launched through a
//! single [`CommandRunner`], which captures each invocation's output into a
//! [`CommandResult`] and re-broadcasts it chunk by chunk on an [`OutputBus`]
//! so a console or log view can follow along live. The [`Client`] builds the
//! project workflow on top: initialize, build, deploy, invoke locally or
//! remotely, delete the stack, and check the required tools are installed.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use swift_lambda_sam::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(Config::from_env());
//!     client.subscribe_to_stdout(|chunk| print!("{}", chunk));
//!     client.subscribe_to_stderr(|chunk| eprint!("{}", chunk));
//!
//!     let check = client.check_all_requirements().await;
//!     if !check.success {
//!         eprintln!("missing tools: {:?}", check.prerequisites);
//!         return Ok(());
//!     }
//!
//!     let result = client.build_project("/Users/me/Documents/my-project").await?;
//!     println!("build finished with exit code {}", result.exit_code);
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Each workflow operation fails with its own error kind
//! ([`ErrorKind::ProjectBuildFailed`], [`ErrorKind::SamInitFailed`], ...),
//! keeping the lower-level failure (a nonzero exit, a missing executable,
//! Docker not running) reachable through [`Error::cause`].
//!
//! ## Features
//!
//! - `cli` - the `swift-lambda-sam` command-line front end

pub mod core;
pub mod runtime;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::core::{
    CliCheckResult, CommandOutput, CommandResult, Config, Error, ErrorKind, Operation,
    Prerequisite, RegionsResult, Result, Template, TemplatesResult, Tools, FAILURE_EXIT_CODE,
};
pub use crate::runtime::{
    Channel, Client, ClientBuilder, CommandRunner, OutputBus, RunCommandOptions, StdioMode,
    StdioOptions, SubscriptionId,
};

/// Common imports for working with the workflow client
pub mod prelude {
    pub use crate::core::{CommandResult, Config, Error, ErrorKind, Result};
    pub use crate::runtime::{Channel, Client, CommandRunner, RunCommandOptions};
}

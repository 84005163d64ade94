//! Command execution, output streaming and the workflow operations built on them

pub mod client;
pub mod process;
pub mod project;
pub mod stream;

pub use client::{Client, ClientBuilder};
pub use process::{CommandRunner, RunCommandOptions, StdioMode, StdioOptions, DEFAULT_COMMAND};
pub use stream::{Channel, OutputBus, SubscriptionId};

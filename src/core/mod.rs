//! Data model, error taxonomy and configuration shared by every layer

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, Tools};
pub use error::{Error, ErrorKind, Operation, Result};
pub use types::{
    CliCheckResult, CommandOutput, CommandResult, Prerequisite, RegionsResult, Template,
    TemplatesResult, FAILURE_EXIT_CODE,
};

//! Command-line front end for the SAM workflow.
//! ## Usage
//!
//! ```bash
//! # Check the required tools are installed
//! swift-lambda-sam check
//!
//! # Create a project from a template
//! swift-lambda-sam init --name my-project --template api-to-lambda
//!
//! # Build and deploy it
//! swift-lambda-sam build --path ~/Documents/aws-lambda-swift/my-project
//! swift-lambda-sam deploy --stack-name my-project --region us-east-1
//!
//! # Invoke a function with one of the project's events
//! swift-lambda-sam local-invoke --function APIGateway --event api.json
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod output;

// Re-export commonly used types
pub use error::{InteractiveError, Result, UserFriendlyError};

/// Version information for the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default directory for storing CLI settings
pub fn default_data_dir() -> std::path::PathBuf {
    directories::ProjectDirs::from("", "", "swift-lambda-sam")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            // Fallback to home directory if project dirs not available
            dirs::home_dir()
                .unwrap_or_else(|| std::path::PathBuf::from("."))
                .join(".swift-lambda-sam")
        })
}

/// Initialize the data directory if it doesn't exist
pub fn ensure_data_dir() -> Result<std::path::PathBuf> {
    let data_dir = default_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
    }
    Ok(data_dir)
}

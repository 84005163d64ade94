use thiserror::Error;

/// Error type of the swift-lambda-sam CLI
#[derive(Error, Debug)]
pub enum InteractiveError {
    /// A workflow operation failed
    #[error(transparent)]
    Workflow(#[from] crate::core::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// `check` found required tools missing
    #[error("Missing requirements: {0}")]
    MissingRequirements(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InteractiveError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a missing requirements error from the tool names
    pub fn missing_requirements<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = tools.into_iter().map(|t| t.as_ref().to_string()).collect();
        Self::MissingRequirements(names.join(", "))
    }

    /// Process exit code for this error
    ///
    /// Always 1; the failing tool's own exit code stays in the message.
    pub fn exit_code(&self) -> i32 {
        crate::core::FAILURE_EXIT_CODE
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::Workflow(err) => err.user_message(),
            Self::MissingRequirements(tools) => {
                format!(
                    "Missing requirements: {}. Install them and run 'swift-lambda-sam check' again.",
                    tools
                )
            }
            Self::Configuration(msg) => {
                format!(
                    "Configuration error: {}. Run 'swift-lambda-sam config path' to locate the settings file.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Convenient result type for the CLI
pub type Result<T> = std::result::Result<T, InteractiveError>;

/// Trait for converting errors to user-friendly messages
pub trait UserFriendlyError {
    fn user_message(&self) -> String;
}

impl UserFriendlyError for InteractiveError {
    fn user_message(&self) -> String {
        self.user_message()
    }
}

impl UserFriendlyError for crate::core::Error {
    fn user_message(&self) -> String {
        crate::core::Error::user_message(self)
    }
}

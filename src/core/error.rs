use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Tag identifying which failure of the workflow occurred
///
/// Serializes to the SCREAMING_SNAKE_CASE names the UI layer matches on
/// (`"SAM_INIT_FAILED"`, `"DOCKER_ERROR"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidCommand,
    CommandFailed,
    SamInitFailed,
    ProjectBuildFailed,
    ProjectDeployFailed,
    LocalInvokeFailed,
    RemoteInvokeFailed,
    StackDeletionFailed,
    CleanupError,
    GitCloneFailed,
    DockerError,
    GetFunctionsFailed,
    GetEventsFailed,
    Io,
    Configuration,
}

impl ErrorKind {
    /// Stable string name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCommand => "INVALID_COMMAND",
            Self::CommandFailed => "COMMAND_FAILED",
            Self::SamInitFailed => "SAM_INIT_FAILED",
            Self::ProjectBuildFailed => "PROJECT_BUILD_FAILED",
            Self::ProjectDeployFailed => "PROJECT_DEPLOY_FAILED",
            Self::LocalInvokeFailed => "LOCAL_INVOKE_FAILED",
            Self::RemoteInvokeFailed => "REMOTE_INVOKE_FAILED",
            Self::StackDeletionFailed => "STACK_DELETION_FAILED",
            Self::CleanupError => "CLEANUP_ERROR",
            Self::GitCloneFailed => "GIT_CLONE_FAILED",
            Self::DockerError => "DOCKER_ERROR",
            Self::GetFunctionsFailed => "GET_FUNCTIONS_FAILED",
            Self::GetEventsFailed => "GET_EVENTS_FAILED",
            Self::Io => "IO",
            Self::Configuration => "CONFIGURATION",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing workflow operations that own a named error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    Build,
    Deploy,
    LocalInvoke,
    RemoteInvoke,
    DeleteStack,
}

impl Operation {
    /// The error kind raised when this operation fails
    pub fn error_kind(self) -> ErrorKind {
        match self {
            Self::Initialize => ErrorKind::SamInitFailed,
            Self::Build => ErrorKind::ProjectBuildFailed,
            Self::Deploy => ErrorKind::ProjectDeployFailed,
            Self::LocalInvoke => ErrorKind::LocalInvokeFailed,
            Self::RemoteInvoke => ErrorKind::RemoteInvokeFailed,
            Self::DeleteStack => ErrorKind::StackDeletionFailed,
        }
    }

    /// Human-readable operation name, used in logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize project",
            Self::Build => "build project",
            Self::Deploy => "deploy project",
            Self::LocalInvoke => "local invoke",
            Self::RemoteInvoke => "remote invoke",
            Self::DeleteStack => "delete stack",
        }
    }

    /// Create a failure of this operation with no underlying cause
    pub fn failure<S: Into<String>>(self, message: S) -> Error {
        self.build(message.into(), None)
    }

    /// Re-raise `err` as this operation's named error, keeping it as the cause
    ///
    /// An error that already carries this operation's kind is returned
    /// unchanged.
    pub fn wrap(self, err: Error) -> Error {
        if err.kind() == self.error_kind() {
            return err;
        }
        self.build(err.to_string(), Some(Box::new(err)))
    }

    fn build(self, message: String, source: Option<Box<Error>>) -> Error {
        match self {
            Self::Initialize => Error::SamInitFailed { message, source },
            Self::Build => Error::ProjectBuildFailed { message, source },
            Self::Deploy => Error::ProjectDeployFailed { message, source },
            Self::LocalInvoke => Error::LocalInvokeFailed { message, source },
            Self::RemoteInvoke => Error::RemoteInvokeFailed { message, source },
            Self::DeleteStack => Error::StackDeletionFailed { message, source },
        }
    }
}

/// Error taxonomy of the command layer and the workflow operations
#[derive(Error, Debug)]
pub enum Error {
    /// The external process could not be started at all
    #[error("{message}")]
    InvalidCommand {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but reported failure
    #[error("{message}")]
    CommandFailed { message: String, exit_code: i32 },

    #[error("{message}")]
    SamInitFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("{message}")]
    ProjectBuildFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("{message}")]
    ProjectDeployFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("{message}")]
    LocalInvokeFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("{message}")]
    RemoteInvokeFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("{message}")]
    StackDeletionFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Removing the staging directory failed for a reason other than absence
    #[error("{message}")]
    Cleanup {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    GitCloneFailed {
        message: String,
        #[source]
        source: Box<Error>,
    },

    /// The container service is unreachable
    #[error("{message}")]
    Docker {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("{message}")]
    GetFunctionsFailed {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    GetEventsFailed {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem failure outside the named workflow operations
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Create an invalid command error
    pub fn invalid_command<S: Into<String>>(message: S, source: std::io::Error) -> Self {
        Self::InvalidCommand {
            message: message.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed<S: Into<String>>(message: S, exit_code: i32) -> Self {
        Self::CommandFailed {
            message: message.into(),
            exit_code,
        }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(message: S, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    /// The taxonomy tag of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCommand { .. } => ErrorKind::InvalidCommand,
            Self::CommandFailed { .. } => ErrorKind::CommandFailed,
            Self::SamInitFailed { .. } => ErrorKind::SamInitFailed,
            Self::ProjectBuildFailed { .. } => ErrorKind::ProjectBuildFailed,
            Self::ProjectDeployFailed { .. } => ErrorKind::ProjectDeployFailed,
            Self::LocalInvokeFailed { .. } => ErrorKind::LocalInvokeFailed,
            Self::RemoteInvokeFailed { .. } => ErrorKind::RemoteInvokeFailed,
            Self::StackDeletionFailed { .. } => ErrorKind::StackDeletionFailed,
            Self::Cleanup { .. } => ErrorKind::CleanupError,
            Self::GitCloneFailed { .. } => ErrorKind::GitCloneFailed,
            Self::Docker { .. } => ErrorKind::DockerError,
            Self::GetFunctionsFailed { .. } => ErrorKind::GetFunctionsFailed,
            Self::GetEventsFailed { .. } => ErrorKind::GetEventsFailed,
            Self::Io { .. } => ErrorKind::Io,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// The wrapped workflow error this one was raised from, if any
    pub fn cause(&self) -> Option<&Error> {
        match self {
            Self::SamInitFailed { source, .. }
            | Self::ProjectBuildFailed { source, .. }
            | Self::ProjectDeployFailed { source, .. }
            | Self::LocalInvokeFailed { source, .. }
            | Self::RemoteInvokeFailed { source, .. }
            | Self::StackDeletionFailed { source, .. }
            | Self::Docker { source, .. } => source.as_deref(),
            Self::GitCloneFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Exit code of the first `CommandFailed` in the cause chain
    pub fn exit_code(&self) -> Option<i32> {
        let mut current = Some(self);
        while let Some(err) = current {
            if let Self::CommandFailed { exit_code, .. } = err {
                return Some(*exit_code);
            }
            current = err.cause();
        }
        None
    }

    /// Whether the failure happened before any process was started
    pub fn is_precondition(&self) -> bool {
        let mut current = Some(self);
        while let Some(err) = current {
            match err {
                Self::CommandFailed { .. } | Self::InvalidCommand { .. } => return false,
                Self::Docker { .. } => return true,
                _ => current = err.cause(),
            }
        }
        true
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCommand { message, source } => {
                format!(
                    "{}: {}. Make sure the tool is installed and available on your PATH.",
                    message, source
                )
            }
            Self::Docker { message, .. } => {
                format!("{} Docker can be installed from https://www.docker.com/.", message)
            }
            Self::GitCloneFailed { message, .. } => {
                format!("{}. Check your internet connection and try again.", message)
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for command and workflow operations
pub type Result<T> = std::result::Result<T, Error>;

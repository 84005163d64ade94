use serde::{Deserialize, Serialize};

/// Exit code reported when a process ends without one (killed by a signal)
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Captured standard streams of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Append another invocation's output after this one
    pub fn extend(&mut self, other: &CommandOutput) {
        self.stdout.push_str(&other.stdout);
        self.stderr.push_str(&other.stderr);
    }
}

/// Outcome of one external process invocation
///
/// A nonzero `exit_code` is still a completed invocation; interpreting it
/// as failure is up to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub exit_code: i32,
    pub output: CommandOutput,
}

impl CommandResult {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One required tool in an aggregate presence check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub name: String,
    pub url: String,
    pub success: bool,
}

/// Result of probing whether required tools are installed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliCheckResult {
    pub success: bool,
    pub exit_code: i32,
    pub output: CommandOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<Prerequisite>>,
}

/// A project template offered for initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub path: String,
}

/// Available project templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesResult {
    pub list: Vec<Template>,
}

/// Deployable regions and the configured default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionsResult {
    pub default: String,
    pub list: Vec<String>,
}

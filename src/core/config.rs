use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Executable names of the wrapped command-line tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tools {
    #[serde(default = "default_sam")]
    pub sam: String,
    #[serde(default = "default_docker")]
    pub docker: String,
    #[serde(default = "default_git")]
    pub git: String,
    #[serde(default = "default_aws")]
    pub aws: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            sam: default_sam(),
            docker: default_docker(),
            git: default_git(),
            aws: default_aws(),
        }
    }
}

/// Settings of the workflow operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Repository holding the project templates
    #[serde(default = "default_templates_repo_url")]
    pub templates_repo_url: String,

    /// Raw-content host of the template repository
    ///
    /// Only read by the template listing, which lives in the UI layer rather
    /// than in this crate.
    #[serde(default = "default_raw_templates_repo_url")]
    pub raw_templates_repo_url: String,

    /// Branch of the template repository to clone
    #[serde(default = "default_template_branch")]
    pub template_branch: String,

    /// Staging directory the template repository is cloned into
    #[serde(default = "default_cloned_templates_dir")]
    pub cloned_templates_dir: PathBuf,

    /// Directory of event payloads, relative to the project
    #[serde(default = "default_events_dir")]
    pub events_dir: String,

    /// Swift package manifest, relative to the project
    #[serde(default = "default_package_file")]
    pub package_file: String,

    /// Pattern whose first capture group is an executable product name
    #[serde(default = "default_functions_pattern")]
    pub functions_pattern: String,

    #[serde(default)]
    pub tools: Tools,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_repo_url: default_templates_repo_url(),
            raw_templates_repo_url: default_raw_templates_repo_url(),
            template_branch: default_template_branch(),
            cloned_templates_dir: default_cloned_templates_dir(),
            events_dir: default_events_dir(),
            package_file: default_package_file(),
            functions_pattern: default_functions_pattern(),
            tools: Tools::default(),
        }
    }
}

impl Config {
    /// Defaults, overridden by the environment variables the extension honours
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup; empty values are ignored
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(value) = get("TEMPLATES_REPO_URL") {
            self.templates_repo_url = value;
        }
        if let Some(value) = get("RAW_TEMPLATES_REPO_URL") {
            self.raw_templates_repo_url = value;
        }
        if let Some(value) = get("TEMPLATE_BRANCH") {
            self.template_branch = value;
        }
        if let Some(value) = get("CLONED_TEMPLATES_DIR") {
            self.cloned_templates_dir = PathBuf::from(value);
        }
        if let Some(value) = get("EVENTS_DIR") {
            self.events_dir = value.trim_matches('/').to_string();
        }
        if let Some(value) = get("SWIFT_PACKAGE_FILE") {
            self.package_file = value.trim_start_matches('/').to_string();
        }
        if let Some(value) = get("SWIFT_PACKAGE_REGEX") {
            self.functions_pattern = value;
        }
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("sam", &self.tools.sam),
            ("docker", &self.tools.docker),
            ("git", &self.tools.git),
            ("aws", &self.tools.aws),
        ] {
            if value.trim().is_empty() {
                return Err(Error::configuration(format!(
                    "tool name for '{}' is empty",
                    name
                )));
            }
        }

        if self.events_dir.is_empty() {
            return Err(Error::configuration("events directory is empty"));
        }

        if self.package_file.is_empty() {
            return Err(Error::configuration("package file is empty"));
        }

        let pattern = regex::Regex::new(&self.functions_pattern).map_err(|e| {
            Error::configuration(format!("invalid functions pattern: {}", e))
        })?;
        if pattern.captures_len() < 2 {
            return Err(Error::configuration(
                "functions pattern needs a capture group for the product name",
            ));
        }

        Ok(())
    }

    /// Location of a template inside the cloned repository
    pub fn template_dir(&self, template: &str) -> PathBuf {
        self.cloned_templates_dir.join("templates").join(template)
    }

    /// Event path as passed to `sam`, relative to the project directory
    pub fn event_arg(&self, event: &str) -> String {
        format!("./{}/{}", self.events_dir, event)
    }
}

fn default_templates_repo_url() -> String {
    "https://github.com/swift-server-community/aws-lambda-swift-sam-template".to_string()
}

fn default_raw_templates_repo_url() -> String {
    "https://raw.githubusercontent.com/swift-server-community/aws-lambda-swift-sam-template"
        .to_string()
}

fn default_template_branch() -> String {
    "main".to_string()
}

fn default_cloned_templates_dir() -> PathBuf {
    PathBuf::from("/tmp/template-repo")
}

fn default_events_dir() -> String {
    "events".to_string()
}

fn default_package_file() -> String {
    "Package.swift".to_string()
}

fn default_functions_pattern() -> String {
    r#"\.executable\(name: "(.*?)""#.to_string()
}

fn default_sam() -> String {
    "sam".to_string()
}

fn default_docker() -> String {
    "docker".to_string()
}

fn default_git() -> String {
    "git".to_string()
}

fn default_aws() -> String {
    "aws".to_string()
}

use crate::cli::error::{InteractiveError, Result};
use crate::core::{Config, Tools};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings of the swift-lambda-sam CLI, stored as TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Default verbosity level
    #[serde(default)]
    pub verbose: bool,

    /// Default quiet mode
    #[serde(default)]
    pub quiet: bool,

    /// Custom data directory (if not using system default)
    pub data_dir: Option<PathBuf>,

    /// Output formatting preferences
    #[serde(default)]
    pub output: OutputDefaults,

    /// Executables of the wrapped tools
    #[serde(default)]
    pub tools: Tools,

    /// Defaults for project arguments left off the command line
    #[serde(default)]
    pub project: ProjectDefaults,
}

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Output formatting defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDefaults {
    /// Enable colored output by default
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format for results
    #[serde(default)]
    pub format: OutputFormat,

    /// Prefix live tool output with the time it arrived
    #[serde(default)]
    pub timestamps: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDefaults {
    /// Project directory used when `--path` is not given
    pub path: Option<PathBuf>,

    /// Region used when `--region` is not given
    pub region: Option<String>,

    /// Template repository branch to clone on `init`
    pub template_branch: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            verbose: false,
            quiet: false,
            data_dir: None,
            output: OutputDefaults::default(),
            tools: Tools::default(),
            project: ProjectDefaults::default(),
        }
    }
}

impl Default for OutputDefaults {
    fn default() -> Self {
        Self {
            color: default_true(),
            format: OutputFormat::Pretty,
            timestamps: false,
        }
    }
}

impl Settings {
    /// Load settings from file, with fallback to defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let settings = Self::default();
            settings.save_to_file(path)?;
            return Ok(settings);
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content).map_err(|e| {
            InteractiveError::configuration(format!("Failed to parse settings file: {}", e))
        })?;

        Ok(settings)
    }

    /// Save settings to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            InteractiveError::configuration(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings file inside `data_dir`
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("config.toml")
    }

    /// Get the default settings file path
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = crate::cli::ensure_data_dir()?;
        Ok(Self::path_in(&data_dir))
    }

    /// Load settings from the default location
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from_file(path)
    }

    /// Merge with command-line arguments, giving priority to CLI args
    pub fn merge_with_cli_args(mut self, cli_args: &crate::cli::cli::Cli) -> Self {
        if cli_args.verbose {
            self.verbose = true;
        }
        if cli_args.quiet {
            self.quiet = true;
        }
        if cli_args.json {
            self.output.format = OutputFormat::Json;
        }
        if cli_args.no_color {
            self.output.color = false;
        }
        if let Some(ref data_dir) = cli_args.data_dir {
            self.data_dir = Some(data_dir.clone());
        }

        self
    }

    /// Default tracing filter directive; quiet wins over verbose
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Library configuration: environment overrides plus these settings
    pub fn library_config(&self) -> Config {
        let mut config = Config::from_env();
        config.tools = self.tools.clone();
        if let Some(branch) = &self.project.template_branch {
            config.template_branch = branch.clone();
        }
        config
    }
}

fn default_true() -> bool {
    true
}

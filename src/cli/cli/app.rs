use crate::cli::cli::commands::*;
use crate::cli::config::Settings;
use crate::cli::error::Result;
use crate::cli::output::{ConsoleStyle, ConsoleSubscription};
use crate::runtime::{Client, CommandRunner};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use std::sync::Arc;

/// Guided AWS SAM workflow for Swift Lambda projects
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress live tool output (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Custom data directory path
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that Docker, the AWS CLI and the SAM CLI are installed
    Check(CheckCommand),

    /// Create a new project from a template
    Init(InitCommand),

    /// Build the project with `sam build`
    Build(BuildCommand),

    /// Deploy the project as a CloudFormation stack
    Deploy(DeployCommand),

    /// Invoke a function locally in a container
    LocalInvoke(LocalInvokeCommand),

    /// Invoke a deployed function
    RemoteInvoke(RemoteInvokeCommand),

    /// Delete a deployed stack
    Delete(DeleteCommand),

    /// List the functions declared in the package manifest
    Functions(FunctionsCommand),

    /// List the event payloads of the project
    Events(EventsCommand),

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Inspect configuration settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Cli {
    /// Settings file contents merged with these flags
    pub fn load_settings(&self) -> Result<Settings> {
        let loaded = match &self.data_dir {
            Some(dir) => Settings::load_from_file(Settings::path_in(dir))?,
            None => Settings::load_default()?,
        };
        Ok(loaded.merge_with_cli_args(self))
    }

    /// Execute the CLI command with already merged settings
    pub async fn execute(self, settings: Settings) -> Result<()> {
        let data_dir: PathBuf = match settings.data_dir.clone() {
            Some(dir) => {
                if !dir.exists() {
                    std::fs::create_dir_all(&dir)?;
                }
                dir
            }
            None => crate::cli::ensure_data_dir()?,
        };

        if !settings.output.color {
            colored::control::set_override(false);
        }

        let workflow = match self.command {
            Commands::Completion { shell } => {
                generate_completion(shell);
                return Ok(());
            }
            Commands::Config { action } => return action.execute(&data_dir, &settings),
            other => other,
        };

        let runner = CommandRunner::shared();
        let client = Client::builder()
            .config(settings.library_config())
            .runner(Arc::clone(&runner))
            .build()?;

        let _console = (!settings.quiet).then(|| {
            ConsoleSubscription::attach(&runner, ConsoleStyle::from_settings(&settings.output))
        });
        let ctx = Context::new(client, settings);

        match workflow {
            Commands::Check(cmd) => cmd.execute(&ctx).await,
            Commands::Init(cmd) => cmd.execute(&ctx).await,
            Commands::Build(cmd) => cmd.execute(&ctx).await,
            Commands::Deploy(cmd) => cmd.execute(&ctx).await,
            Commands::LocalInvoke(cmd) => cmd.execute(&ctx).await,
            Commands::RemoteInvoke(cmd) => cmd.execute(&ctx).await,
            Commands::Delete(cmd) => cmd.execute(&ctx).await,
            Commands::Functions(cmd) => cmd.execute(&ctx).await,
            Commands::Events(cmd) => cmd.execute(&ctx).await,
            Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
        }
    }
}

/// Generate shell completion script
fn generate_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}

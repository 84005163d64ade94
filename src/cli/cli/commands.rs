//! Subcommand implementations
//!
//! Each command resolves its arguments (falling back to the settings file),
//! calls one workflow operation and prints the outcome. Live tool output is
//! already on the terminal through the console subscription.

use crate::cli::config::{OutputFormat, Settings};
use crate::cli::error::{InteractiveError, Result};
use crate::cli::output;
use crate::runtime::Client;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

/// What every workflow command needs
pub struct Context {
    pub client: Client,
    pub settings: Settings,
}

impl Context {
    pub fn new(client: Client, settings: Settings) -> Self {
        Self { client, settings }
    }

    pub fn format(&self) -> OutputFormat {
        self.settings.output.format
    }

    /// `--path`, else the settings' project path, else the current directory
    fn project_path(&self, path: Option<PathBuf>) -> Result<String> {
        let path = match path.or_else(|| self.settings.project.path.clone()) {
            Some(path) => path,
            None => std::env::current_dir()?,
        };
        Ok(path.display().to_string())
    }

    fn region(&self, region: Option<String>) -> Result<String> {
        region
            .or_else(|| self.settings.project.region.clone())
            .ok_or_else(|| {
                InteractiveError::invalid_input(
                    "no region given; pass --region, set AWS_REGION or set project.region in the settings file",
                )
            })
    }
}

#[derive(Args)]
pub struct CheckCommand {}

impl CheckCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let check = ctx.client.check_all_requirements().await;

        let tools = &ctx.client.config().tools;
        let locations: Vec<(String, Option<PathBuf>)> = [&tools.aws, &tools.sam, &tools.docker]
            .into_iter()
            .map(|tool| (tool.clone(), which::which(tool).ok()))
            .collect();

        output::print_check(ctx.format(), &check, &locations)?;

        if !check.success {
            let missing = check
                .prerequisites
                .iter()
                .flatten()
                .filter(|p| !p.success)
                .map(|p| p.name.as_str());
            return Err(InteractiveError::missing_requirements(missing));
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct InitCommand {
    /// Name of the new project
    #[arg(long)]
    pub name: String,

    /// Template to start from (e.g. api-to-lambda)
    #[arg(long)]
    pub template: String,

    /// Parent directory of the project [default: ~/Documents/aws-lambda-swift]
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl InitCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let parent = match self.path.or_else(|| ctx.settings.project.path.clone()) {
            Some(path) => path,
            None => ctx.client.default_project_path().await?,
        };

        let target = parent.join(&self.name);
        if ctx.client.check_folder_exists(&target).await {
            return Err(InteractiveError::invalid_input(format!(
                "'{}' already exists",
                target.display()
            )));
        }

        info!("Creating project {} from template {}", self.name, self.template);
        let parent = parent.display().to_string();
        let result = ctx
            .client
            .initialize_project(&self.name, &self.template, &parent)
            .await?;

        output::print_completed(
            ctx.format(),
            &format!("Created project '{}' in {}", self.name, target.display()),
            &result,
        )
    }
}

#[derive(Args)]
pub struct BuildCommand {
    /// Project directory [default: current directory]
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl BuildCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let path = ctx.project_path(self.path)?;
        let result = ctx.client.build_project(&path).await?;
        output::print_completed(ctx.format(), &format!("Built {}", path), &result)
    }
}

#[derive(Args)]
pub struct DeployCommand {
    /// CloudFormation stack name
    #[arg(long)]
    pub stack_name: String,

    /// AWS region to deploy to
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Project directory [default: current directory]
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl DeployCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let path = ctx.project_path(self.path)?;
        let region = ctx.region(self.region)?;
        let result = ctx
            .client
            .deploy_project(&self.stack_name, &path, &region)
            .await?;
        output::print_completed(
            ctx.format(),
            &format!("Deployed stack '{}' to {}", self.stack_name, region),
            &result,
        )
    }
}

#[derive(Args)]
pub struct LocalInvokeCommand {
    /// Function (executable product) to invoke
    #[arg(long)]
    pub function: String,

    /// Event file name inside the project's events directory
    #[arg(long)]
    pub event: String,

    /// Project directory [default: current directory]
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl LocalInvokeCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let path = ctx.project_path(self.path)?;
        let result = ctx
            .client
            .local_invoke(&self.function, &self.event, &path)
            .await?;
        output::print_completed(
            ctx.format(),
            &format!("Invoked '{}' locally", self.function),
            &result,
        )
    }
}

#[derive(Args)]
pub struct RemoteInvokeCommand {
    /// CloudFormation stack name
    #[arg(long)]
    pub stack_name: String,

    /// Function (logical resource id) to invoke
    #[arg(long)]
    pub function: String,

    /// AWS region of the stack
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Event file name inside the project's events directory
    #[arg(long)]
    pub event: String,

    /// Project directory [default: current directory]
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl RemoteInvokeCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let path = ctx.project_path(self.path)?;
        let region = ctx.region(self.region)?;
        let result = ctx
            .client
            .remote_invoke(&self.stack_name, &self.function, &region, &self.event, &path)
            .await?;
        output::print_completed(
            ctx.format(),
            &format!("Invoked '{}' in stack '{}'", self.function, self.stack_name),
            &result,
        )
    }
}

#[derive(Args)]
pub struct DeleteCommand {
    /// CloudFormation stack name
    #[arg(long)]
    pub stack_name: String,

    /// AWS region of the stack
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,
}

impl DeleteCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let region = ctx.region(self.region)?;
        let result = ctx.client.delete_stack(&self.stack_name, &region).await?;
        output::print_completed(
            ctx.format(),
            &format!("Deleted stack '{}' in {}", self.stack_name, region),
            &result,
        )
    }
}

#[derive(Args)]
pub struct FunctionsCommand {
    /// Project directory [default: current directory]
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl FunctionsCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let path = ctx.project_path(self.path)?;
        let functions = ctx.client.get_functions(&path).await?;
        output::print_list(ctx.format(), "Functions", &functions)
    }
}

#[derive(Args)]
pub struct EventsCommand {
    /// Project directory [default: current directory]
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl EventsCommand {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        let path = ctx.project_path(self.path)?;
        let events = ctx.client.get_events(&path).await?;
        output::print_list(ctx.format(), "Events", &events)
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,

    /// Print the settings file location
    Path,
}

impl ConfigAction {
    pub fn execute(self, data_dir: &Path, settings: &Settings) -> Result<()> {
        match self {
            Self::Show => {
                if settings.output.format == OutputFormat::Json {
                    return output::print_json(settings);
                }
                let content = toml::to_string_pretty(settings).map_err(|e| {
                    InteractiveError::configuration(format!("Failed to serialize settings: {}", e))
                })?;
                print!("{}", content);
                Ok(())
            }
            Self::Path => {
                println!("{}", Settings::path_in(data_dir).display());
                Ok(())
            }
        }
    }
}

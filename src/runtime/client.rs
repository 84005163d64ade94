use crate::core::{
    CliCheckResult, CommandOutput, CommandResult, Config, Error, Operation, Prerequisite, Result,
    FAILURE_EXIT_CODE,
};
use crate::runtime::process::{CommandRunner, RunCommandOptions};
use crate::runtime::project::{self, cleanup_temp_directory, event_file_is_empty};
use crate::runtime::stream::{Channel, OutputBus, SubscriptionId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Marker `sam delete` prints when the stack is unknown, while exiting 0
const STACK_MISSING_MARKER: &str = "does not exist";

const DOCKER_URL: &str = "https://www.docker.com/";
const AWS_CLI_URL: &str =
    "https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html";
const SAM_CLI_URL: &str = "https://docs.aws.amazon.com/serverless-application-model/latest/developerguide/serverless-sam-cli-install.html";

/// High-level client for the SAM project workflow
///
/// Each operation validates its parameters, checks its preconditions, runs
/// one external tool through the shared [`CommandRunner`] and maps the
/// outcome onto the operation's named error. Validation and precondition
/// failures return before any process is spawned.
///
/// # Examples
///
/// ```rust,no_run
/// # use swift_lambda_sam::{Client, Config};
/// # #[tokio::main]
/// # async fn main() -> swift_lambda_sam::Result<()> {
/// let client = Client::new(Config::from_env());
/// client.subscribe_to_console(|chunk| print!("{}", chunk));
///
/// client.build_project("/Users/me/Documents/my-project").await?;
/// client
///     .deploy_project("sqs", "/Users/me/Documents/my-project", "us-east-1")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<Config>,
    runner: Arc<CommandRunner>,
}

impl Client {
    /// Create a client with its own runner
    pub fn new(config: Config) -> Self {
        Self::with_runner(config, CommandRunner::shared())
    }

    /// Create a client that publishes on an existing runner's bus
    pub fn with_runner(config: Config, runner: Arc<CommandRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }

    /// Create a new client builder for fluent configuration
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &Arc<CommandRunner> {
        &self.runner
    }

    pub fn bus(&self) -> &OutputBus {
        self.runner.bus()
    }

    pub fn subscribe_to_stdout<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.bus().subscribe(Channel::Stdout, listener)
    }

    pub fn unsubscribe_from_stdout(&self, id: SubscriptionId) -> bool {
        self.bus().unsubscribe(Channel::Stdout, id)
    }

    pub fn subscribe_to_stderr<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.bus().subscribe(Channel::Stderr, listener)
    }

    pub fn unsubscribe_from_stderr(&self, id: SubscriptionId) -> bool {
        self.bus().unsubscribe(Channel::Stderr, id)
    }

    /// Receive both channels through one listener, as a console view does
    ///
    /// Undo with [`OutputBus::unsubscribe_all`].
    pub fn subscribe_to_console<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.bus().subscribe_all(listener)
    }

    /// Scaffold a new project from a template
    ///
    /// Clears the staging directory, clones the template repository into
    /// it, runs `sam init` in `path` and clears the staging directory again.
    /// The returned output is the clone output followed by the init output.
    pub async fn initialize_project(
        &self,
        name: &str,
        template: &str,
        path: &str,
    ) -> Result<CommandResult> {
        debug!(
            "Initializing project with template {} and name {} in directory {}...",
            template, name, path
        );
        self.try_initialize_project(name, template, path)
            .await
            .map_err(|e| Operation::Initialize.wrap(e))
    }

    async fn try_initialize_project(
        &self,
        name: &str,
        template: &str,
        path: &str,
    ) -> Result<CommandResult> {
        let op = Operation::Initialize;
        require(op, "name", name)?;
        require(op, "template", template)?;
        require(op, "path", path)?;

        let staging = &self.config.cloned_templates_dir;
        cleanup_temp_directory(staging).await?;

        let outcome = self.clone_and_init(name, template, path).await;
        match outcome {
            Ok(output) => {
                cleanup_temp_directory(staging).await?;
                Ok(CommandResult {
                    exit_code: 0,
                    output,
                })
            }
            Err(e) => {
                if let Err(cleanup) = cleanup_temp_directory(staging).await {
                    warn!(error = %cleanup, "staging cleanup after failed init also failed");
                }
                Err(e)
            }
        }
    }

    async fn clone_and_init(&self, name: &str, template: &str, path: &str) -> Result<CommandOutput> {
        let mut output = CommandOutput::default();

        let cloned = self.clone_template().await?;
        output.extend(&cloned.output);
        if !cloned.success() {
            return Err(Error::command_failed(
                format!("Failed to clone the template: {}", template),
                cloned.exit_code,
            ));
        }

        let args = vec![
            "init".to_string(),
            "-l".to_string(),
            self.config.template_dir(template).display().to_string(),
            "--name".to_string(),
            name.to_string(),
            "--no-interactive".to_string(),
            "--no-input".to_string(),
        ];
        let init = self.sam(args, Some(path)).await?;
        output.extend(&init.output);
        if !init.success() {
            return Err(Error::command_failed(
                format!(
                    "Failed to initialize project '{}' with template '{}' in '{}'",
                    name, template, path
                ),
                init.exit_code,
            ));
        }

        Ok(output)
    }

    /// Shallow-clone the configured template branch into the staging directory
    pub async fn clone_template(&self) -> Result<CommandResult> {
        let args = vec![
            "clone".to_string(),
            "--single-branch".to_string(),
            "--branch".to_string(),
            self.config.template_branch.clone(),
            "--depth".to_string(),
            "1".to_string(),
            self.config.templates_repo_url.clone(),
            self.config.cloned_templates_dir.display().to_string(),
        ];

        self.runner
            .run_command(RunCommandOptions::new(args).command(&self.config.tools.git))
            .await
            .map_err(|e| Error::GitCloneFailed {
                message: "Failed to clone the template repository".to_string(),
                source: Box::new(e),
            })
    }

    /// Run `sam build` in the project directory
    pub async fn build_project(&self, path: &str) -> Result<CommandResult> {
        debug!("Building project in directory {}...", path);
        self.try_build_project(path)
            .await
            .map_err(|e| Operation::Build.wrap(e))
    }

    async fn try_build_project(&self, path: &str) -> Result<CommandResult> {
        require(Operation::Build, "path", path)?;
        self.is_docker_running().await?;

        let result = self.sam(vec!["build".to_string()], Some(path)).await?;
        expect_success(result, || format!("Failed to build project in '{}'", path))
    }

    /// Run `sam deploy` for `stack_name` in `region`
    pub async fn deploy_project(
        &self,
        stack_name: &str,
        path: &str,
        region: &str,
    ) -> Result<CommandResult> {
        debug!(
            "Deploying project with stack name {} in directory {}...",
            stack_name, path
        );
        self.try_deploy_project(stack_name, path, region)
            .await
            .map_err(|e| Operation::Deploy.wrap(e))
    }

    async fn try_deploy_project(
        &self,
        stack_name: &str,
        path: &str,
        region: &str,
    ) -> Result<CommandResult> {
        let op = Operation::Deploy;
        require(op, "stack name", stack_name)?;
        require(op, "path", path)?;
        require(op, "region", region)?;

        let args = vec![
            "deploy".to_string(),
            "--stack-name".to_string(),
            stack_name.to_string(),
            "--region".to_string(),
            region.to_string(),
            "--resolve-s3".to_string(),
            "--no-confirm-changeset".to_string(),
        ];
        let result = self.sam(args, Some(path)).await?;
        expect_success(result, || {
            format!(
                "Failed to deploy project with stackName '{}' in '{}'",
                stack_name, path
            )
        })
    }

    /// Invoke a function in a local container with an event payload
    pub async fn local_invoke(
        &self,
        function_name: &str,
        event: &str,
        path: &str,
    ) -> Result<CommandResult> {
        debug!(
            "Invoking function {} with event {} in directory {}...",
            function_name, event, path
        );
        self.try_local_invoke(function_name, event, path)
            .await
            .map_err(|e| Operation::LocalInvoke.wrap(e))
    }

    async fn try_local_invoke(
        &self,
        function_name: &str,
        event: &str,
        path: &str,
    ) -> Result<CommandResult> {
        let op = Operation::LocalInvoke;
        require(op, "function name", function_name)?;
        require(op, "event", event)?;
        require(op, "path", path)?;
        self.require_event_payload(op, path, event).await?;
        self.is_docker_running().await?;

        let event_arg = self.config.event_arg(event);
        let args = vec![
            "local".to_string(),
            "invoke".to_string(),
            function_name.to_string(),
            "--event".to_string(),
            event_arg.clone(),
        ];
        let result = self.sam(args, Some(path)).await?;
        expect_success(result, || {
            format!(
                "Failed to invoke function '{}' with event from '{}' locally in '{}'. Local invoke only works with the 'api-to-lambda' template",
                function_name, event_arg, path
            )
        })
    }

    /// Invoke a deployed function with an event payload
    pub async fn remote_invoke(
        &self,
        stack_name: &str,
        function_name: &str,
        region: &str,
        event: &str,
        path: &str,
    ) -> Result<CommandResult> {
        debug!("Invoking function remotely...");
        self.try_remote_invoke(stack_name, function_name, region, event, path)
            .await
            .map_err(|e| Operation::RemoteInvoke.wrap(e))
    }

    async fn try_remote_invoke(
        &self,
        stack_name: &str,
        function_name: &str,
        region: &str,
        event: &str,
        path: &str,
    ) -> Result<CommandResult> {
        let op = Operation::RemoteInvoke;
        require(op, "stack name", stack_name)?;
        require(op, "function name", function_name)?;
        require(op, "region", region)?;
        require(op, "event", event)?;
        require(op, "path", path)?;
        self.require_event_payload(op, path, event).await?;

        let event_arg = self.config.event_arg(event);
        let args = vec![
            "remote".to_string(),
            "invoke".to_string(),
            "--region".to_string(),
            region.to_string(),
            "--stack-name".to_string(),
            stack_name.to_string(),
            function_name.to_string(),
            "--event-file".to_string(),
            event_arg.clone(),
        ];
        let result = self.sam(args, Some(path)).await?;
        expect_success(result, || {
            format!(
                "Failed to invoke function '{}' with event from '{}' remotely in '{}'",
                function_name, event_arg, path
            )
        })
    }

    /// Delete a deployed stack
    ///
    /// `sam delete` exits 0 for an unknown stack, so its stdout is checked
    /// for the "does not exist" marker as well.
    pub async fn delete_stack(&self, stack_name: &str, region: &str) -> Result<CommandResult> {
        debug!("Deleting stack: {}, in region: {}...", stack_name, region);
        self.try_delete_stack(stack_name, region)
            .await
            .map_err(|e| Operation::DeleteStack.wrap(e))
    }

    async fn try_delete_stack(&self, stack_name: &str, region: &str) -> Result<CommandResult> {
        let op = Operation::DeleteStack;
        require(op, "stack name", stack_name)?;
        require(op, "region", region)?;

        let args = vec![
            "delete".to_string(),
            "--stack-name".to_string(),
            stack_name.to_string(),
            "--region".to_string(),
            region.to_string(),
            "--no-prompts".to_string(),
        ];
        let result = self.sam(args, None).await?;
        if !result.success() || result.output.stdout.contains(STACK_MISSING_MARKER) {
            return Err(Error::command_failed(
                format!(
                    "Failed to delete stack with stackName '{}'. Please ensure the stack exists in the region '{}'",
                    stack_name, region
                ),
                result.exit_code,
            ));
        }
        Ok(result)
    }

    /// Probe a tool with `<tool> --version`
    ///
    /// Never fails: a missing tool is reported as `success: false`.
    pub async fn run_check(&self, command: &str) -> CliCheckResult {
        let options = RunCommandOptions::new(["--version"]).command(command);
        match self.runner.run_command(options).await {
            Ok(result) => CliCheckResult {
                success: result.success(),
                exit_code: result.exit_code,
                output: result.output,
                prerequisites: None,
            },
            Err(e) => {
                debug!(command, error = %e, "tool check failed to start");
                CliCheckResult {
                    success: false,
                    exit_code: FAILURE_EXIT_CODE,
                    output: CommandOutput {
                        stdout: String::new(),
                        stderr: e.to_string(),
                    },
                    prerequisites: None,
                }
            }
        }
    }

    pub async fn check_aws_cli(&self) -> CliCheckResult {
        debug!("Checking AWS CLI...");
        self.run_check(&self.config.tools.aws).await
    }

    pub async fn check_sam_cli(&self) -> CliCheckResult {
        debug!("Checking SAM CLI...");
        self.run_check(&self.config.tools.sam).await
    }

    pub async fn check_docker(&self) -> CliCheckResult {
        debug!("Checking Docker...");
        self.run_check(&self.config.tools.docker).await
    }

    /// Check every tool the workflow needs
    ///
    /// Outputs are concatenated in aws, sam, docker order; `prerequisites`
    /// lists each tool with its install page.
    pub async fn check_all_requirements(&self) -> CliCheckResult {
        debug!("Checking all requirements...");
        let (aws, sam, docker) = tokio::join!(
            self.check_aws_cli(),
            self.check_sam_cli(),
            self.check_docker()
        );

        let success = aws.success && sam.success && docker.success;
        let mut output = CommandOutput::default();
        for check in [&aws, &sam, &docker] {
            output.extend(&check.output);
        }

        CliCheckResult {
            success,
            exit_code: if success { 0 } else { FAILURE_EXIT_CODE },
            output,
            prerequisites: Some(vec![
                prerequisite("Docker", DOCKER_URL, docker.success),
                prerequisite("AWS CLI", AWS_CLI_URL, aws.success),
                prerequisite("AWS SAM CLI", SAM_CLI_URL, sam.success),
            ]),
        }
    }

    /// Confirm the Docker daemon answers `docker info`
    pub async fn is_docker_running(&self) -> Result<()> {
        let unavailable = |source: Error| Error::Docker {
            message: "Docker is not running or not installed. Please ensure Docker is running and try again."
                .to_string(),
            source: Some(Box::new(source)),
        };

        let options = RunCommandOptions::new(["info"]).command(&self.config.tools.docker);
        let result = self.runner.run_command(options).await.map_err(unavailable)?;
        if !result.success() {
            return Err(unavailable(Error::command_failed(
                "Failed to check if Docker is running",
                result.exit_code,
            )));
        }
        Ok(())
    }

    pub async fn get_functions(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        debug!("Getting functions...");
        project::get_functions(path.as_ref(), &self.config).await
    }

    pub async fn get_events(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        debug!("Getting events...");
        project::get_events(path.as_ref(), &self.config).await
    }

    pub async fn check_folder_exists(&self, path: impl AsRef<Path>) -> bool {
        project::check_folder_exists(path.as_ref()).await
    }

    pub async fn default_project_path(&self) -> Result<PathBuf> {
        project::default_project_path().await
    }

    async fn sam(&self, args: Vec<String>, cwd: Option<&str>) -> Result<CommandResult> {
        let mut options = RunCommandOptions::new(args).command(&self.config.tools.sam);
        if let Some(cwd) = cwd {
            options = options.cwd(cwd);
        }
        self.runner.run_command(options).await
    }

    async fn require_event_payload(&self, op: Operation, path: &str, event: &str) -> Result<()> {
        let relative = format!("{}/{}", self.config.events_dir, event);
        let file = Path::new(path).join(&self.config.events_dir).join(event);
        match event_file_is_empty(&file).await {
            Ok(false) => Ok(()),
            Ok(true) => Err(op.failure(format!(
                "Event file '{}' is empty. Please provide a valid event file.",
                relative
            ))),
            Err(e) => Err(op.failure(format!(
                "Event file '{}' could not be read: {}",
                relative, e
            ))),
        }
    }
}

/// Fail with the operation's error naming `field` if `value` is blank
fn require(op: Operation, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        let action = match op {
            Operation::LocalInvoke | Operation::RemoteInvoke => "invoke function",
            other => other.name(),
        };
        return Err(op.failure(format!(
            "Failed to {}. Please ensure the {} is filled",
            action, field
        )));
    }
    Ok(())
}

fn expect_success<F>(result: CommandResult, message: F) -> Result<CommandResult>
where
    F: FnOnce() -> String,
{
    if result.success() {
        Ok(result)
    } else {
        Err(Error::command_failed(message(), result.exit_code))
    }
}

fn prerequisite(name: &str, url: &str, success: bool) -> Prerequisite {
    Prerequisite {
        name: name.to_string(),
        url: url.to_string(),
        success,
    }
}

/// Builder for creating `Client` instances with fluent configuration
///
/// # Examples
///
/// ```rust,no_run
/// # use swift_lambda_sam::Client;
/// let client = Client::builder()
///     .sam_command("/opt/homebrew/bin/sam")
///     .template_branch("main")
///     .build()
///     .expect("valid configuration");
/// ```
pub struct ClientBuilder {
    config: Config,
    runner: Option<Arc<CommandRunner>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new client builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            runner: None,
        }
    }

    /// Set the configuration directly
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Share an existing runner (and its output bus)
    pub fn runner(mut self, runner: Arc<CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn sam_command(mut self, command: impl Into<String>) -> Self {
        self.config.tools.sam = command.into();
        self
    }

    pub fn docker_command(mut self, command: impl Into<String>) -> Self {
        self.config.tools.docker = command.into();
        self
    }

    pub fn git_command(mut self, command: impl Into<String>) -> Self {
        self.config.tools.git = command.into();
        self
    }

    pub fn aws_command(mut self, command: impl Into<String>) -> Self {
        self.config.tools.aws = command.into();
        self
    }

    pub fn templates_repo_url(mut self, url: impl Into<String>) -> Self {
        self.config.templates_repo_url = url.into();
        self
    }

    pub fn template_branch(mut self, branch: impl Into<String>) -> Self {
        self.config.template_branch = branch.into();
        self
    }

    /// Set the template staging directory
    pub fn cloned_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cloned_templates_dir = dir.into();
        self
    }

    pub fn events_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.events_dir = dir.into();
        self
    }

    /// Build the final client instance
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn build(self) -> Result<Client> {
        self.config.validate()?;
        let runner = self.runner.unwrap_or_else(CommandRunner::shared);
        Ok(Client::with_runner(self.config, runner))
    }
}

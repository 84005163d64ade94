#![cfg(unix)]

mod common;

use common::{canonical, Workspace};
use parking_lot::Mutex;
use std::sync::Arc;
use swift_lambda_sam::ErrorKind;

const DOCKER_UP: &str = "exit 0";
const DOCKER_DOWN: &str = "echo 'Cannot connect to the Docker daemon' >&2; exit 1";

#[tokio::test]
async fn build_runs_sam_in_project_and_streams_output() {
    let ws = Workspace::new();
    ws.tool("docker", DOCKER_UP);
    ws.tool("sam", "echo 'Build Succeeded'");
    let client = ws.client();

    let seen = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&seen);
    client.subscribe_to_stdout(move |chunk| sink.lock().push_str(chunk));

    let result = client.build_project(&ws.project_str()).await.unwrap();

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.output.stdout, "Build Succeeded\n");
    assert_eq!(*seen.lock(), "Build Succeeded\n");
    assert_eq!(ws.args("docker"), vec!["info"]);
    assert_eq!(
        ws.calls("sam"),
        vec![format!("{}|build", canonical(&ws.project()))]
    );
}

#[tokio::test]
async fn build_with_empty_path_spawns_nothing() {
    let ws = Workspace::new();
    ws.tool("docker", DOCKER_UP);
    ws.tool("sam", "exit 0");

    let err = ws.client().build_project("").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProjectBuildFailed);
    assert_eq!(
        err.to_string(),
        "Failed to build project. Please ensure the path is filled"
    );
    assert!(ws.calls("docker").is_empty());
    assert!(ws.calls("sam").is_empty());
}

#[tokio::test]
async fn build_stops_when_docker_is_down() {
    let ws = Workspace::new();
    ws.tool("docker", DOCKER_DOWN);
    ws.tool("sam", "exit 0");

    let err = ws.client().build_project(&ws.project_str()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProjectBuildFailed);
    assert_eq!(err.cause().map(|e| e.kind()), Some(ErrorKind::DockerError));
    assert!(err.is_precondition());
    assert!(err.to_string().contains("Docker is not running"));
    assert!(ws.calls("sam").is_empty());
}

#[tokio::test]
async fn build_failure_keeps_exit_code() {
    let ws = Workspace::new();
    ws.tool("docker", DOCKER_UP);
    ws.tool("sam", "echo 'Build Failed' >&2; exit 2");

    let err = ws.client().build_project(&ws.project_str()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProjectBuildFailed);
    assert_eq!(err.exit_code(), Some(2));
    assert_eq!(
        err.to_string(),
        format!("Failed to build project in '{}'", ws.project_str())
    );
    assert_eq!(err.cause().map(|e| e.kind()), Some(ErrorKind::CommandFailed));
}

#[tokio::test]
async fn build_with_missing_sam_is_invalid_command() {
    let ws = Workspace::new();
    ws.tool("docker", DOCKER_UP);

    let err = ws.client().build_project(&ws.project_str()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProjectBuildFailed);
    assert_eq!(err.cause().map(|e| e.kind()), Some(ErrorKind::InvalidCommand));
    assert!(err.user_message().contains("build"));
}

#[tokio::test]
async fn deploy_passes_stack_and_region() {
    let ws = Workspace::new();
    ws.tool("sam", "echo 'Successfully created/updated stack - sqs in us-east-1'");

    let result = ws
        .client()
        .deploy_project("sqs", &ws.project_str(), "us-east-1")
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(
        ws.args("sam"),
        vec!["deploy --stack-name sqs --region us-east-1 --resolve-s3 --no-confirm-changeset"]
    );
    // Deploy has no container precondition.
    assert!(ws.calls("docker").is_empty());
}

#[tokio::test]
async fn deploy_without_region_spawns_nothing() {
    let ws = Workspace::new();
    ws.tool("sam", "exit 0");

    let err = ws
        .client()
        .deploy_project("sqs", &ws.project_str(), "")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProjectDeployFailed);
    assert_eq!(
        err.to_string(),
        "Failed to deploy project. Please ensure the region is filled"
    );
    assert!(ws.calls("sam").is_empty());
}

#[tokio::test]
async fn local_invoke_passes_relative_event() {
    let ws = Workspace::new();
    ws.tool("docker", DOCKER_UP);
    ws.tool("sam", "echo '{\"statusCode\":200}'");
    ws.write_event("api.json", "{\"body\": \"hello\"}");

    let result = ws
        .client()
        .local_invoke("APIGateway", "api.json", &ws.project_str())
        .await
        .unwrap();

    assert_eq!(result.output.stdout, "{\"statusCode\":200}\n");
    assert_eq!(
        ws.args("sam"),
        vec!["local invoke APIGateway --event ./events/api.json"]
    );
}

#[tokio::test]
async fn local_invoke_rejects_empty_event_before_docker() {
    let ws = Workspace::new();
    ws.tool("docker", DOCKER_UP);
    ws.tool("sam", "exit 0");
    ws.write_event("api.json", "");

    let err = ws
        .client()
        .local_invoke("APIGateway", "api.json", &ws.project_str())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LocalInvokeFailed);
    assert_eq!(
        err.to_string(),
        "Event file 'events/api.json' is empty. Please provide a valid event file."
    );
    assert!(ws.calls("docker").is_empty());
    assert!(ws.calls("sam").is_empty());
}

#[tokio::test]
async fn local_invoke_failure_mentions_template() {
    let ws = Workspace::new();
    ws.tool("docker", DOCKER_UP);
    ws.tool("sam", "exit 1");
    ws.write_event("api.json", "{}");

    let err = ws
        .client()
        .local_invoke("APIGateway", "api.json", &ws.project_str())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LocalInvokeFailed);
    assert!(err.to_string().contains("'api-to-lambda' template"));
    assert!(err.to_string().contains("./events/api.json"));
}

#[tokio::test]
async fn remote_invoke_passes_stack_function_and_event() {
    let ws = Workspace::new();
    ws.tool("sam", "echo 'Invoking Lambda Function SQSQueueListener'");
    ws.write_event("sqs.json", "{\"Records\": []}");

    ws.client()
        .remote_invoke("sqs", "SQSQueueListener", "eu-west-1", "sqs.json", &ws.project_str())
        .await
        .unwrap();

    assert_eq!(
        ws.args("sam"),
        vec!["remote invoke --region eu-west-1 --stack-name sqs SQSQueueListener --event-file ./events/sqs.json"]
    );
    assert!(ws.calls("docker").is_empty());
}

#[tokio::test]
async fn remote_invoke_empty_event_is_remote_failure() {
    let ws = Workspace::new();
    ws.tool("sam", "exit 0");
    ws.write_event("sqs.json", "");

    let err = ws
        .client()
        .remote_invoke("sqs", "SQSQueueListener", "eu-west-1", "sqs.json", &ws.project_str())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteInvokeFailed);
    assert!(ws.calls("sam").is_empty());
}

#[tokio::test]
async fn delete_runs_without_project_directory() {
    let ws = Workspace::new();
    ws.tool("sam", "echo 'Deleted successfully'");

    ws.client().delete_stack("sqs", "us-east-1").await.unwrap();

    let cwd = canonical(&std::env::current_dir().unwrap());
    assert_eq!(
        ws.calls("sam"),
        vec![format!(
            "{}|delete --stack-name sqs --region us-east-1 --no-prompts",
            cwd
        )]
    );
}

#[tokio::test]
async fn delete_of_unknown_stack_fails_despite_exit_zero() {
    let ws = Workspace::new();
    ws.tool(
        "sam",
        "echo 'Error: The input stack sqs does not exist on Cloudformation'; exit 0",
    );

    let err = ws.client().delete_stack("sqs", "us-east-1").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StackDeletionFailed);
    assert_eq!(
        err.to_string(),
        "Failed to delete stack with stackName 'sqs'. Please ensure the stack exists in the region 'us-east-1'"
    );
    assert_eq!(err.exit_code(), Some(0));
}

#[tokio::test]
async fn initialize_clones_template_and_cleans_staging() {
    let ws = Workspace::new();
    // Arguments: clone --single-branch --branch <b> --depth 1 <repo> <dir>
    ws.tool(
        "git",
        "mkdir -p \"$8/templates/api-to-lambda\"; echo \"Cloning into '$8'...\"",
    );
    // Arguments: init -l <template dir> --name <name> --no-interactive --no-input
    ws.tool("sam", "mkdir \"$5\" && echo \"Created $5\"");

    // Stale staging content from an earlier run is cleared first.
    std::fs::create_dir_all(ws.staging().join("leftover")).unwrap();

    let result = ws
        .client()
        .initialize_project("my-project", "api-to-lambda", &ws.project_str())
        .await
        .unwrap();

    assert_eq!(result.exit_code, 0);
    let staging = ws.staging().display().to_string();
    assert_eq!(
        result.output.stdout,
        format!("Cloning into '{}'...\nCreated my-project\n", staging)
    );
    assert!(ws.project().join("my-project").is_dir());
    assert!(!ws.staging().exists());

    assert_eq!(
        ws.args("git"),
        vec![format!(
            "clone --single-branch --branch main --depth 1 https://example.invalid/templates.git {}",
            staging
        )]
    );
    assert_eq!(
        ws.calls("sam"),
        vec![format!(
            "{}|init -l {}/templates/api-to-lambda --name my-project --no-interactive --no-input",
            canonical(&ws.project()),
            staging
        )]
    );
}

#[tokio::test]
async fn initialize_stops_when_clone_fails() {
    let ws = Workspace::new();
    ws.tool("git", "echo 'fatal: repository not found' >&2; exit 128");
    ws.tool("sam", "exit 0");

    let err = ws
        .client()
        .initialize_project("my-project", "api-to-lambda", &ws.project_str())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SamInitFailed);
    assert_eq!(err.to_string(), "Failed to clone the template: api-to-lambda");
    assert_eq!(err.exit_code(), Some(128));
    assert!(ws.calls("sam").is_empty());
}

#[tokio::test]
async fn initialize_failure_after_clone_still_cleans_staging() {
    let ws = Workspace::new();
    ws.tool("git", "mkdir -p \"$8/templates/api-to-lambda\"");
    ws.tool("sam", "echo 'Error: template not found' >&2; exit 1");

    let err = ws
        .client()
        .initialize_project("my-project", "api-to-lambda", &ws.project_str())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SamInitFailed);
    assert_eq!(
        err.to_string(),
        format!(
            "Failed to initialize project 'my-project' with template 'api-to-lambda' in '{}'",
            ws.project_str()
        )
    );
    assert_eq!(err.exit_code(), Some(1));
    assert_eq!(ws.calls("sam").len(), 1);
    assert!(!ws.staging().exists());
    assert!(!ws.project().join("my-project").exists());
}

#[tokio::test]
async fn initialize_without_git_is_clone_failure() {
    let ws = Workspace::new();
    ws.tool("sam", "exit 0");

    let err = ws
        .client()
        .initialize_project("my-project", "api-to-lambda", &ws.project_str())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SamInitFailed);
    let cause = err.cause().unwrap();
    assert_eq!(cause.kind(), ErrorKind::GitCloneFailed);
    assert_eq!(cause.cause().map(|e| e.kind()), Some(ErrorKind::InvalidCommand));
    assert!(ws.calls("sam").is_empty());
}

#[tokio::test]
async fn initialize_with_empty_template_spawns_nothing() {
    let ws = Workspace::new();
    ws.tool("git", "exit 0");
    ws.tool("sam", "exit 0");

    let err = ws
        .client()
        .initialize_project("my-project", "", &ws.project_str())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to initialize project. Please ensure the template is filled"
    );
    assert!(ws.calls("git").is_empty());
    assert!(ws.calls("sam").is_empty());
}

#[tokio::test]
async fn check_all_requirements_reports_each_tool() {
    let ws = Workspace::new();
    ws.tool("aws", "echo 'aws-cli/2.15.0'");
    ws.tool("sam", "echo 'SAM CLI, version 1.100.0'");
    // No docker fake: it is reported as missing.

    let check = ws.client().check_all_requirements().await;

    assert!(!check.success);
    assert_eq!(check.exit_code, 1);
    assert!(check.output.stdout.starts_with("aws-cli/2.15.0\nSAM CLI, version 1.100.0\n"));
    assert!(check.output.stderr.contains("docker --version"));

    let prerequisites = check.prerequisites.unwrap();
    let summary: Vec<(&str, bool)> = prerequisites
        .iter()
        .map(|p| (p.name.as_str(), p.success))
        .collect();
    assert_eq!(
        summary,
        vec![("Docker", false), ("AWS CLI", true), ("AWS SAM CLI", true)]
    );
    assert_eq!(prerequisites[0].url, "https://www.docker.com/");
}

#[tokio::test]
async fn check_all_requirements_succeeds_with_every_tool() {
    let ws = Workspace::new();
    for tool in ["aws", "sam", "docker"] {
        ws.tool(tool, "echo version");
    }

    let check = ws.client().check_all_requirements().await;

    assert!(check.success);
    assert_eq!(check.exit_code, 0);
    assert!(check.prerequisites.unwrap().iter().all(|p| p.success));
    assert_eq!(ws.args("docker"), vec!["--version"]);
}

#[tokio::test]
async fn project_listing_helpers() {
    let ws = Workspace::new();
    std::fs::write(
        ws.project().join("Package.swift"),
        ".executable(name: \"APIGateway\", targets: [\"APIGateway\"]),",
    )
    .unwrap();
    ws.write_event("api.json", "{}");
    let client = ws.client();

    assert_eq!(client.get_functions(ws.project()).await.unwrap(), vec!["APIGateway"]);
    assert_eq!(client.get_events(ws.project()).await.unwrap(), vec!["api.json"]);
    assert!(client.check_folder_exists(ws.project()).await);
    assert!(!client.check_folder_exists(ws.project().join("missing")).await);
}

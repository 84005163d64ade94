//! Fake `sam`/`docker`/`git`/`aws` executables for driving the workflow

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use swift_lambda_sam::{Client, CommandRunner, Config};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Workspace {
    pub dir: TempDir,
    pub runner: Arc<CommandRunner>,
}

impl Workspace {
    pub fn new() -> Self {
        let workspace = Self {
            dir: tempfile::tempdir().unwrap(),
            runner: CommandRunner::shared(),
        };
        fs::create_dir_all(workspace.project()).unwrap();
        fs::create_dir_all(workspace.project().join("events")).unwrap();
        workspace
    }

    /// Scratch project directory
    pub fn project(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    pub fn project_str(&self) -> String {
        self.project().display().to_string()
    }

    pub fn staging(&self) -> PathBuf {
        self.dir.path().join("staging")
    }

    /// Write an executable script named `name`; every call is logged as `cwd|args`
    pub fn tool(&self, name: &str, body: &str) -> String {
        let path = self.dir.path().join(name);
        let log = self.log_path(name);
        let script = format!(
            "#!/bin/sh\nprintf '%s|%s\\n' \"$(pwd -P)\" \"$*\" >> '{}'\n{}\n",
            log.display(),
            body
        );
        // Tests run in parallel threads, so a write fd on the executable
        // could leak into another test's fork and fail exec with ETXTBSY.
        // `cp` writes it from a separate process instead.
        let source = self.dir.path().join(format!("{}.src", name));
        fs::write(&source, script).unwrap();
        let copied = Command::new("cp").arg(&source).arg(&path).status().unwrap();
        assert!(copied.success(), "failed to install fake {}", name);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    /// Logged invocations of a fake tool, oldest first
    pub fn calls(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.log_path(name))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Arguments of each logged invocation
    pub fn args(&self, name: &str) -> Vec<String> {
        self.calls(name)
            .into_iter()
            .map(|call| call.split_once('|').map(|(_, args)| args.to_string()).unwrap_or_default())
            .collect()
    }

    pub fn write_event(&self, name: &str, content: &str) {
        fs::write(self.project().join("events").join(name), content).unwrap();
    }

    /// Client wired to whichever fakes exist; missing ones point nowhere
    pub fn client(&self) -> Client {
        let bin = |name: &str| self.dir.path().join(name).display().to_string();
        let config = Config {
            cloned_templates_dir: self.staging(),
            templates_repo_url: "https://example.invalid/templates.git".to_string(),
            ..Config::default()
        };

        Client::builder()
            .config(config)
            .sam_command(bin("sam"))
            .docker_command(bin("docker"))
            .git_command(bin("git"))
            .aws_command(bin("aws"))
            .runner(Arc::clone(&self.runner))
            .build()
            .unwrap()
    }

    fn log_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{}.log", name))
    }
}

pub fn canonical(path: &Path) -> String {
    path.canonicalize().unwrap().display().to_string()
}

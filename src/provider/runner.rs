// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command runner abstraction
//!
//! Every external tool the provisioner drives (`vagrant`, `openstack`) is
//! spawned through [`CommandRunner`]. [`ProcessRunner`] is the production
//! implementation; [`ScriptedRunner`] records commands and replays canned
//! output so orchestration code can be tested without a hypervisor.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Failure to run an external command
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The process could not be started
    #[error("Failed to execute `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    /// The process ran and exited unsuccessfully
    #[error("`{command}` exited with {}: {}", exit_label(.code), .stderr.trim())]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// A fully described command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn envs(mut self, env: Vec<(String, String)>) -> Self {
        self.env.extend(env);
        self
    }

    /// Program and arguments joined by spaces (environment is never shown)
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Trait for executing external commands
///
/// Returns stdout on success. Calls are awaited one at a time by every caller
/// in this crate.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<String, CommandError>;
}

/// Production runner backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        debug!("Running {}", spec);

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let output = command.output().await.map_err(|e| CommandError::Spawn {
            command: spec.command_line(),
            reason: e.to_string(),
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(CommandError::Failed {
                command: spec.command_line(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}

/// Test-double runner that records commands and replays scripted responses
///
/// Responses are keyed by command-line prefix; the longest matching prefix
/// wins. Unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<Vec<(String, Result<String, String>)>>,
    commands: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout` for commands starting with `prefix`
    pub fn respond(self, prefix: &str, stdout: &str) -> Self {
        self.push(prefix, Ok(stdout.to_string()));
        self
    }

    /// Fail with `stderr` for commands starting with `prefix`
    pub fn fail(self, prefix: &str, stderr: &str) -> Self {
        self.push(prefix, Err(stderr.to_string()));
        self
    }

    fn push(&self, prefix: &str, response: Result<String, String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.retain(|(p, _)| p != prefix);
            responses.push((prefix.to_string(), response));
        }
    }

    /// Every command line run so far, in order
    pub fn executed_commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .map(|c| c.iter().map(CommandSpec::command_line).collect())
            .unwrap_or_default()
    }

    /// Every spec run so far, including cwd and environment
    pub fn executed_specs(&self) -> Vec<CommandSpec> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of executed commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.executed_commands()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        let line = spec.command_line();
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(spec.clone());
        }

        let response = self.responses.lock().ok().and_then(|responses| {
            responses
                .iter()
                .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, response)| response.clone())
        });

        match response {
            Some(Ok(stdout)) => Ok(stdout),
            Some(Err(stderr)) => Err(CommandError::Failed {
                command: line,
                code: Some(1),
                stderr,
            }),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let spec = CommandSpec::new("vagrant")
            .arg("up")
            .args(["infra-001", "--provider=openstack"])
            .envs(vec![("OS_PASSWORD".to_string(), "secret".to_string())]);
        assert_eq!(spec.command_line(), "vagrant up infra-001 --provider=openstack");
        assert!(!spec.to_string().contains("secret"));
    }

    #[test]
    fn test_failure_message_names_exit_code_or_signal() {
        let failed = |code| CommandError::Failed {
            command: "vagrant up infra-001".to_string(),
            code,
            stderr: "boom\n".to_string(),
        };
        assert_eq!(
            failed(Some(2)).to_string(),
            "`vagrant up infra-001` exited with 2: boom"
        );
        assert_eq!(
            failed(None).to_string(),
            "`vagrant up infra-001` exited with signal: boom"
        );
    }

    #[tokio::test]
    async fn test_scripted_runner_records_commands() {
        let runner = ScriptedRunner::new();
        runner.run(&CommandSpec::new("echo").arg("hello")).await.unwrap();
        runner.run(&CommandSpec::new("echo").arg("world")).await.unwrap();
        assert_eq!(runner.executed_commands(), vec!["echo hello", "echo world"]);
        assert_eq!(runner.count("echo"), 2);
    }

    #[tokio::test]
    async fn test_scripted_runner_longest_prefix_wins() {
        let runner = ScriptedRunner::new()
            .respond("vagrant", "generic")
            .respond("vagrant status", "specific");
        let out = runner
            .run(&CommandSpec::new("vagrant").arg("status"))
            .await
            .unwrap();
        assert_eq!(out, "specific");
        let out = runner.run(&CommandSpec::new("vagrant").arg("up")).await.unwrap();
        assert_eq!(out, "generic");
    }

    #[tokio::test]
    async fn test_scripted_runner_failures() {
        let runner = ScriptedRunner::new().fail("vagrant up", "VBoxManage error");
        let err = runner
            .run(&CommandSpec::new("vagrant").args(["up", "infra-001"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Failed { code: Some(1), .. }));
        assert!(err.to_string().contains("VBoxManage error"));
    }

    #[tokio::test]
    async fn test_scripted_runner_defaults_to_empty_ok() {
        let runner = ScriptedRunner::new();
        let out = runner.run(&CommandSpec::new("anything")).await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_process_runner_reports_spawn_failure() {
        let err = ProcessRunner
            .run(&CommandSpec::new("definitely-not-a-real-binary-4242"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}

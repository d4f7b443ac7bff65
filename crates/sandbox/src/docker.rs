//! Compose orchestration over the docker CLI.
//!
//! Both the standalone `docker-compose` binary and the `docker compose`
//! plugin are supported; [`ComposeDriver::detect`] prefers the former
//! and falls back to the latter, matching what is actually installed on
//! developer machines. Health state comes from `docker inspect` on the
//! container rather than from compose, which has no stable health
//! output across versions.

use std::fmt::Display;
use std::path::PathBuf;
use std::process::Output;

use tokio::process::Command;
use tracing::debug;

use crate::Result;
use crate::error::SandboxError;

/// Container health, as reported by the docker engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Starting,
    Healthy,
    Unhealthy,
    NotRunning,
    Unknown(String),
}

impl HealthStatus {
    pub fn as_str(&self) -> &str {
        match self {
            HealthStatus::Starting => "starting",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::NotRunning => "not running",
            HealthStatus::Unknown(other) => other,
        }
    }
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs compose commands against one compose file.
#[derive(Debug, Clone)]
pub struct ComposeDriver {
    program: &'static str,
    base_args: Vec<&'static str>,
    compose_file: PathBuf,
}

impl ComposeDriver {
    /// Pick the available compose flavor.
    pub async fn detect(compose_file: PathBuf) -> Result<Self> {
        if binary_available("docker-compose").await {
            return Ok(ComposeDriver::with_program(
                "docker-compose",
                vec![],
                compose_file,
            ));
        }
        if binary_available("docker").await {
            return Ok(ComposeDriver::with_program(
                "docker",
                vec!["compose"],
                compose_file,
            ));
        }
        Err(SandboxError::DockerUnavailable)
    }

    pub fn with_program(
        program: &'static str,
        base_args: Vec<&'static str>,
        compose_file: PathBuf,
    ) -> Self {
        ComposeDriver {
            program,
            base_args,
            compose_file,
        }
    }

    /// Start the service in the background.
    pub async fn up(&self) -> Result<()> {
        self.run(&["up", "-d"]).await?;
        Ok(())
    }

    /// Stop and remove the service. With `remove_volumes`, the named
    /// volume goes too and the next start gets an empty database.
    pub async fn down(&self, remove_volumes: bool) -> Result<()> {
        let mut args = vec!["down"];
        if remove_volumes {
            args.push("--volumes");
        }
        self.run(&args).await?;
        Ok(())
    }

    /// Raw `compose ps` listing.
    pub async fn ps(&self) -> Result<String> {
        let output = self.run(&["ps"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Health state of a container, from `docker inspect`.
    ///
    /// A missing container is a state, not an error.
    pub async fn inspect_health(&self, container: &str) -> Result<HealthStatus> {
        let mut cmd = Command::new("docker");
        cmd.args(["inspect", "--format", "{{json .State.Health}}", container]);
        let command = format!("docker inspect {container}");
        debug!(%command, "querying container health");

        let output = cmd.output().await.map_err(|source| SandboxError::Spawn {
            command: command.clone(),
            source,
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No such object") {
                return Ok(HealthStatus::NotRunning);
            }
            return Err(SandboxError::CommandFailed {
                command,
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(parse_health(&String::from_utf8_lossy(&output.stdout)))
    }

    fn build_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = Vec::with_capacity(self.base_args.len() + args.len() + 2);
        full.extend(self.base_args.iter().map(|arg| arg.to_string()));
        full.push("-f".into());
        full.push(self.compose_file.display().to_string());
        full.extend(args.iter().map(|arg| arg.to_string()));
        full
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut line = self.program.to_string();
        for arg in self.build_args(args) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        let command = self.command_line(args);
        debug!(%command, "running compose command");

        let output = Command::new(self.program)
            .args(self.build_args(args))
            .output()
            .await
            .map_err(|source| SandboxError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SandboxError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

async fn binary_available(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Decode `docker inspect --format '{{json .State.Health}}'` output.
/// `null` means the container has no healthcheck configured.
fn parse_health(raw: &str) -> HealthStatus {
    let value: serde_json::Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => return HealthStatus::Unknown(raw.trim().to_string()),
    };
    match value.get("Status").and_then(|status| status.as_str()) {
        Some("starting") => HealthStatus::Starting,
        Some("healthy") => HealthStatus::Healthy,
        Some("unhealthy") => HealthStatus::Unhealthy,
        Some(other) => HealthStatus::Unknown(other.to_string()),
        None => HealthStatus::Unknown("no healthcheck".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(program: &'static str, base_args: Vec<&'static str>) -> ComposeDriver {
        ComposeDriver::with_program(program, base_args, PathBuf::from("docker-compose.yml"))
    }

    #[test]
    fn test_plugin_args_include_compose_prefix() {
        let driver = driver("docker", vec!["compose"]);
        assert_eq!(
            driver.build_args(&["up", "-d"]),
            ["compose", "-f", "docker-compose.yml", "up", "-d"]
        );
    }

    #[test]
    fn test_standalone_args_have_no_prefix() {
        let driver = driver("docker-compose", vec![]);
        assert_eq!(
            driver.build_args(&["down", "--volumes"]),
            ["-f", "docker-compose.yml", "down", "--volumes"]
        );
    }

    #[test]
    fn test_command_line_rendering() {
        let driver = driver("docker", vec!["compose"]);
        assert_eq!(
            driver.command_line(&["ps"]),
            "docker compose -f docker-compose.yml ps"
        );
    }

    #[test]
    fn test_parse_health_states() {
        assert_eq!(
            parse_health(r#"{"Status":"healthy","FailingStreak":0,"Log":[]}"#),
            HealthStatus::Healthy
        );
        assert_eq!(
            parse_health(r#"{"Status":"starting","FailingStreak":1,"Log":[]}"#),
            HealthStatus::Starting
        );
        assert_eq!(
            parse_health(r#"{"Status":"unhealthy","FailingStreak":5,"Log":[]}"#),
            HealthStatus::Unhealthy
        );
        assert_eq!(
            parse_health("null"),
            HealthStatus::Unknown("no healthcheck".to_string())
        );
        assert_eq!(
            parse_health("not json"),
            HealthStatus::Unknown("not json".to_string())
        );
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ContainerRuntime`: abstract container lifecycle operations.
//!
//! The orchestrator never talks to a container engine directly; it is
//! parameterised over this trait so the poll loop's crash-detection and the
//! recovery subsystem's health probes can be tested with [`FakeContainerRuntime`]
//! instead of a real daemon.

use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use std::time::Duration;

/// Timeout for a single `docker`/`podman` CLI call (start, stop, inspect, pull).
const RUNTIME_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced by a container runtime call.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),
    #[error("image pull failed for {image}: {message}")]
    ImagePullFailed { image: String, message: String },
    #[error("unknown mount type for {mount}: {raw}")]
    UnknownMountType { mount: String, raw: String },
    #[error("runtime call failed: {0}")]
    CallFailed(String),
}

/// Whether a container is currently running, and its exit code if not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub running: bool,
    pub healthy: bool,
    pub exit_code: Option<i32>,
}

/// A mount attached to a container, classified by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountKind {
    Bind { host_path: PathBuf, read_only: bool },
    Volume { name: String },
    Tmpfs,
}

/// Serialize a bind mount the way the runtime's CLI/API expects:
/// `source:destination[:options,propagation]`, appending `ro` when read-only.
pub fn serialize_bind_mount(source: &str, destination: &str, read_only: bool) -> String {
    if read_only {
        format!("{source}:{destination}:ro")
    } else {
        format!("{source}:{destination}")
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn start(&self, container: &str) -> Result<(), ContainerError>;

    /// Stop gracefully; if `force` is set, remove the container even if the
    /// graceful stop fails or times out.
    async fn stop(&self, container: &str, force: bool) -> Result<(), ContainerError>;

    async fn inspect(&self, container: &str) -> Result<ContainerStatus, ContainerError>;

    async fn pull_image(&self, image: &str) -> Result<(), ContainerError>;

    async fn ensure_image_exists(&self, image: &str) -> Result<(), ContainerError> {
        self.pull_image(image).await
    }

    /// Open a channel of log lines for `container`. Returns `Ok(None)` if the
    /// container has no attachable log stream yet (used by the log streamer's
    /// retry loop to distinguish "not ready" from a hard error).
    async fn stream_logs(
        &self,
        container: &str,
    ) -> Result<Option<tokio::sync::mpsc::Receiver<String>>, ContainerError>;

    async fn list_mounts(&self, container: &str) -> Result<Vec<MountKind>, ContainerError>;
}

#[derive(Debug, Deserialize)]
struct DockerState {
    #[serde(rename = "Running")]
    running: bool,
    #[serde(rename = "ExitCode")]
    exit_code: i32,
    #[serde(rename = "Health")]
    health: Option<DockerHealth>,
}

#[derive(Debug, Deserialize)]
struct DockerHealth {
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Debug, Deserialize)]
struct DockerMount {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Destination")]
    destination: String,
    #[serde(rename = "RW")]
    rw: bool,
    #[serde(rename = "Name")]
    name: Option<String>,
}

/// Real `ContainerRuntime` backed by a CLI binary speaking the Docker CLI
/// dialect (`docker` or a drop-in such as `podman`/`nerdctl`).
pub struct CliContainerRuntime {
    binary: String,
}

impl CliContainerRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd
    }

    async fn run(&self, args: &[&str], description: &str) -> Result<std::process::Output, ContainerError> {
        run_with_timeout(self.command(args), RUNTIME_CALL_TIMEOUT, description)
            .await
            .map_err(ContainerError::CallFailed)
    }
}

impl Default for CliContainerRuntime {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl ContainerRuntime for CliContainerRuntime {
    async fn start(&self, container: &str) -> Result<(), ContainerError> {
        let output = self.run(&["start", container], "container start").await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ContainerError::CallFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    async fn stop(&self, container: &str, force: bool) -> Result<(), ContainerError> {
        let output = self.run(&["stop", container], "container stop").await?;
        if output.status.success() {
            return Ok(());
        }
        if !force {
            return Err(ContainerError::CallFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let output = self.run(&["rm", "-f", container], "container force-remove").await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ContainerError::CallFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    async fn inspect(&self, container: &str) -> Result<ContainerStatus, ContainerError> {
        let output = self
            .run(
                &["inspect", "--format", "{{json .State}}", container],
                "container inspect",
            )
            .await?;
        if !output.status.success() {
            return Err(ContainerError::NotFound(container.to_string()));
        }
        let state: DockerState = serde_json::from_slice(&output.stdout).map_err(|e| {
            ContainerError::CallFailed(format!("malformed inspect output for {container}: {e}"))
        })?;
        Ok(ContainerStatus {
            running: state.running,
            healthy: state
                .health
                .map(|h| h.status == "healthy")
                .unwrap_or(state.running),
            exit_code: if state.running { None } else { Some(state.exit_code) },
        })
    }

    async fn pull_image(&self, image: &str) -> Result<(), ContainerError> {
        let output = self.run(&["pull", image], "image pull").await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ContainerError::ImagePullFailed {
                image: image.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn stream_logs(
        &self,
        container: &str,
    ) -> Result<Option<mpsc::Receiver<String>>, ContainerError> {
        let mut cmd = self.command(&["logs", "-f", "--tail", "0", container]);
        cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        let mut child = cmd
            .spawn()
            .map_err(|e| ContainerError::CallFailed(format!("spawn logs -f: {e}")))?;
        let Some(stdout) = child.stdout.take() else {
            return Ok(None);
        };
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        tracing::debug!(error = %err, "log stream read error");
                        break;
                    }
                }
            }
            let _ = child.kill().await;
        });
        Ok(Some(rx))
    }

    async fn list_mounts(&self, container: &str) -> Result<Vec<MountKind>, ContainerError> {
        let output = self
            .run(
                &["inspect", "--format", "{{json .Mounts}}", container],
                "container inspect mounts",
            )
            .await?;
        if !output.status.success() {
            return Err(ContainerError::NotFound(container.to_string()));
        }
        let mounts: Vec<DockerMount> = serde_json::from_slice(&output.stdout).map_err(|e| {
            ContainerError::CallFailed(format!("malformed mounts output for {container}: {e}"))
        })?;
        mounts
            .into_iter()
            .map(|m| match m.kind.as_str() {
                "bind" => Ok(MountKind::Bind {
                    host_path: PathBuf::from(m.source),
                    read_only: !m.rw,
                }),
                "volume" => Ok(MountKind::Volume {
                    name: m.name.unwrap_or(m.destination),
                }),
                "tmpfs" => Ok(MountKind::Tmpfs),
                other => Err(ContainerError::UnknownMountType {
                    mount: m.destination,
                    raw: other.to_string(),
                }),
            })
            .collect()
    }
}

/// In-memory fake for tests: containers are pre-seeded with a status and an
/// optional canned log stream.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeContainerRuntime {
    pub statuses: parking_lot::Mutex<HashMap<String, ContainerStatus>>,
    pub log_lines: parking_lot::Mutex<HashMap<String, Vec<String>>>,
    pub pulled_images: parking_lot::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeContainerRuntime {
    fn default() -> Self {
        Self {
            statuses: parking_lot::Mutex::new(HashMap::new()),
            log_lines: parking_lot::Mutex::new(HashMap::new()),
            pulled_images: parking_lot::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeContainerRuntime {
    pub fn set_status(&self, container: &str, status: ContainerStatus) {
        self.statuses.lock().insert(container.to_string(), status);
    }

    pub fn set_log_lines(&self, container: &str, lines: Vec<String>) {
        self.log_lines.lock().insert(container.to_string(), lines);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ContainerRuntime for FakeContainerRuntime {
    async fn start(&self, container: &str) -> Result<(), ContainerError> {
        self.statuses.lock().insert(
            container.to_string(),
            ContainerStatus {
                running: true,
                healthy: true,
                exit_code: None,
            },
        );
        Ok(())
    }

    async fn stop(&self, container: &str, _force: bool) -> Result<(), ContainerError> {
        if let Some(status) = self.statuses.lock().get_mut(container) {
            status.running = false;
            status.exit_code = Some(0);
        }
        Ok(())
    }

    async fn inspect(&self, container: &str) -> Result<ContainerStatus, ContainerError> {
        self.statuses
            .lock()
            .get(container)
            .cloned()
            .ok_or_else(|| ContainerError::NotFound(container.to_string()))
    }

    async fn pull_image(&self, image: &str) -> Result<(), ContainerError> {
        self.pulled_images.lock().push(image.to_string());
        Ok(())
    }

    async fn stream_logs(
        &self,
        container: &str,
    ) -> Result<Option<tokio::sync::mpsc::Receiver<String>>, ContainerError> {
        let lines = self.log_lines.lock().get(container).cloned();
        let Some(lines) = lines else {
            return Ok(None);
        };
        let (tx, rx) = tokio::sync::mpsc::channel(lines.len().max(1));
        for line in lines {
            let _ = tx.send(line).await;
        }
        Ok(Some(rx))
    }

    async fn list_mounts(&self, _container: &str) -> Result<Vec<MountKind>, ContainerError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;

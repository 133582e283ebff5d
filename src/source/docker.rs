//! Docker-backed log source.
//!
//! Containers are discovered through the swarm service-name label and tagged
//! with their task name. The logs endpoint returns one multiplexed frame
//! stream per container; a pump task splits it into two plain byte pipes so
//! the framing layer never sees Docker's wire format.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{ListContainersOptions, LogOutput, LogsOptions};
use bollard::models::ContainerSummary;
use bollard::Docker;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::{FollowOptions, LogSource, LogStream, SourceDescriptor, SourceError};

/// Label identifying the swarm service a container belongs to.
const SERVICE_NAME_LABEL: &str = "com.docker.swarm.service.name";
/// Label carrying the swarm task name used for tagging.
const TASK_NAME_LABEL: &str = "com.docker.swarm.task.name";

/// Capacity of each in-memory pipe between the pump and a framer. The pump
/// blocks when a pipe is full, so the daemon is only read as fast as the
/// output is drained.
const PIPE_CAPACITY: usize = 8192;

pub struct DockerSource {
    docker: Docker,
}

impl DockerSource {
    /// Connect to the local Docker daemon.
    pub fn connect() -> Result<Self, SourceError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    async fn list(
        &self,
        filters: HashMap<String, Vec<String>>,
    ) -> Result<Vec<SourceDescriptor>, SourceError> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                filters,
                ..Default::default()
            }))
            .await?;

        Ok(containers.into_iter().filter_map(to_descriptor).collect())
    }
}

#[async_trait]
impl LogSource for DockerSource {
    async fn list_all(&self) -> Result<Vec<SourceDescriptor>, SourceError> {
        self.list(HashMap::new()).await
    }

    async fn list_by_service(&self, name: &str) -> Result<Vec<SourceDescriptor>, SourceError> {
        let filters = HashMap::from([(
            "label".to_string(),
            vec![format!("{SERVICE_NAME_LABEL}={name}")],
        )]);
        self.list(filters).await
    }

    async fn open_follow(
        &self,
        id: &str,
        opts: &FollowOptions,
    ) -> Result<(LogStream, LogStream), SourceError> {
        // The logs endpoint reports a missing container as a stream item
        // rather than at call time; probe existence up front so a bad id
        // still fails the open, not the follow.
        self.docker.inspect_container(id, None).await?;

        let tail = if opts.tail.is_empty() {
            "all".to_string()
        } else {
            opts.tail.clone()
        };

        let options = LogsOptions::<String> {
            follow: opts.follow,
            stdout: true,
            stderr: true,
            tail,
            ..Default::default()
        };

        let (mut stdout_tx, stdout_rx) = tokio::io::duplex(PIPE_CAPACITY);
        let (mut stderr_tx, stderr_rx) = tokio::io::duplex(PIPE_CAPACITY);
        let docker = self.docker.clone();
        let id = id.to_string();

        tokio::spawn(async move {
            let mut frames = docker.logs(&id, Some(options));
            while let Some(frame) = frames.next().await {
                let written = match frame {
                    Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                        stdout_tx.write_all(&message).await
                    }
                    Ok(LogOutput::StdErr { message }) => stderr_tx.write_all(&message).await,
                    Ok(LogOutput::StdIn { .. }) => Ok(()),
                    Err(err) => {
                        warn!("log stream for {} ended with error: {}", id, err);
                        break;
                    }
                };
                if written.is_err() {
                    // Reader side dropped, stop pumping.
                    break;
                }
            }
            // Dropping the write halves signals EOF to both framers.
        });

        Ok((Box::new(stdout_rx), Box::new(stderr_rx)))
    }
}

fn to_descriptor(container: ContainerSummary) -> Option<SourceDescriptor> {
    let id = container.id?;
    let name = container
        .labels
        .as_ref()
        .and_then(|labels| labels.get(TASK_NAME_LABEL).cloned())
        .or_else(|| {
            container
                .names
                .as_ref()
                .and_then(|names| names.first())
                .map(|name| name.trim_start_matches('/').to_string())
        })
        .unwrap_or_else(|| id.chars().take(12).collect());

    Some(SourceDescriptor { id, name })
}

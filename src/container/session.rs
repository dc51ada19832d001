use bollard::errors::Error as DockerError;

use super::config::{ConnectionMode, ContainerSpec, SessionConfig};
use super::runtime::{ContainerRuntime, DockerRuntime};
use crate::error::SessionError;

/// A single freerouting container bound to one TCP port.
///
/// The session records the container ID only once the container has been
/// created *and* started, and forgets it again on `stop()`. It is driven by
/// one caller: `start` and `stop` take `&mut self`.
#[derive(Debug)]
pub struct ContainerSession<R: ContainerRuntime = DockerRuntime> {
    port: u16,
    config: SessionConfig,
    runtime: R,
    container_id: Option<String>,
}

impl ContainerSession<DockerRuntime> {
    /// Create a session for `port` using the connection mode of the current host
    pub fn new(port: u16) -> Result<Self, SessionError> {
        Self::with_config(port, SessionConfig::default())
    }

    pub fn with_config(port: u16, config: SessionConfig) -> Result<Self, SessionError> {
        let runtime = DockerRuntime::connect(&config)?;
        Ok(Self::with_runtime(port, config, runtime))
    }
}

impl<R: ContainerRuntime> ContainerSession<R> {
    /// Create a session on top of an existing runtime client
    pub fn with_runtime(port: u16, config: SessionConfig, runtime: R) -> Self {
        log::info!(
            "Container session initialized, port: {}, daemon: {}",
            port,
            runtime.connection().describe()
        );

        Self {
            port,
            config,
            runtime,
            container_id: None,
        }
    }

    /// Pull the image, then create and start a container publishing the session port.
    ///
    /// Calling this while a container is already recorded starts a second,
    /// independent container and replaces the recorded ID. Stopping the first
    /// one is the caller's job.
    ///
    /// A container that is created but fails to start is force-removed on a
    /// best-effort basis before the error is returned.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if let Some(existing) = &self.container_id {
            log::warn!(
                "start() called while container {} is still recorded; it will no longer be tracked",
                existing
            );
        }

        log::info!("Starting docker container on port {}", self.port);

        log::info!("Pulling docker image {}", self.config.image);
        self.runtime
            .pull_image(&self.config.image)
            .await
            .map_err(|source| self.pull_error(source))?;
        log::info!("Pull completed");

        let spec = ContainerSpec::new(&self.config, self.port);
        log::info!("Creating container");
        let id = self
            .runtime
            .create_container(&spec)
            .await
            .map_err(|source| SessionError::Create { source })?;

        if let Err(source) = self.runtime.start_container(&id).await {
            log::error!("Container {} was created but failed to start: {}", id, source);
            // Auto-remove only fires for containers that ran
            if let Err(e) = self.runtime.remove_container(&id).await {
                log::warn!("Error removing unstarted container {}: {}", id, e);
            }
            return Err(SessionError::Start { id, source });
        }

        log::info!("Container started with ID: {}", id);
        self.container_id = Some(id);
        Ok(())
    }

    /// Kill the recorded container. Never fails.
    ///
    /// With auto-remove enabled the daemon deletes the container after the kill.
    /// The recorded ID is cleared whether or not the kill succeeded; failures are
    /// only logged.
    pub async fn stop(&mut self) {
        let Some(id) = self.container_id.take() else {
            return;
        };

        match self.runtime.kill_container(&id).await {
            Ok(()) => log::info!("Docker container {} stopped and removed", id),
            Err(e) => log::warn!("Error stopping/removing container {}: {}", id, e),
        }
    }

    /// Whether the recorded container is running. Inspection failures count as not running.
    pub async fn is_running(&self) -> bool {
        let Some(id) = &self.container_id else {
            return false;
        };

        match self.runtime.is_container_running(id).await {
            Ok(running) => running,
            Err(e) => {
                log::debug!("Failed to inspect container {}: {}", id, e);
                false
            }
        }
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connection(&self) -> &ConnectionMode {
        self.runtime.connection()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Over TCP, a pull that never got an answer from the daemon points at the
    /// endpoint not being exposed. Anything the daemon answered is a plain pull failure.
    fn pull_error(&self, source: DockerError) -> SessionError {
        log::error!("Pull error: {}", source);
        match self.runtime.connection().endpoint() {
            Some(endpoint) if !daemon_replied(&source) => {
                SessionError::TcpEndpointUnavailable { endpoint, source }
            }
            _ => SessionError::Pull {
                image: self.config.image.clone(),
                source,
            },
        }
    }
}

/// Whether the error carries a response from the daemon rather than a transport failure
fn daemon_replied(error: &DockerError) -> bool {
    matches!(
        error,
        DockerError::DockerResponseServerError { .. } | DockerError::DockerStreamError { .. }
    )
}

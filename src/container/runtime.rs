use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::errors::Error as DockerError;
use bollard::models::{ContainerCreateBody, HostConfig, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, KillContainerOptions,
    RemoveContainerOptions, StartContainerOptions,
};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::StreamExt;

use super::config::{ConnectionMode, ContainerSpec, SessionConfig};
use crate::error::SessionError;

/// Operations a session needs from the container runtime daemon
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// How this client reaches the daemon
    fn connection(&self) -> &ConnectionMode;

    /// Pull an image, returning once the progress stream has ended without error
    async fn pull_image(&self, image: &str) -> Result<(), DockerError>;

    /// Create a container from `spec` and return its ID
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DockerError>;

    async fn start_container(&self, id: &str) -> Result<(), DockerError>;

    async fn kill_container(&self, id: &str) -> Result<(), DockerError>;

    /// Force-remove a container, running or not
    async fn remove_container(&self, id: &str) -> Result<(), DockerError>;

    /// Read the container's `State.Running` flag
    async fn is_container_running(&self, id: &str) -> Result<bool, DockerError>;
}

/// Bollard-backed runtime talking to a real Docker daemon
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
    connection: ConnectionMode,
}

impl DockerRuntime {
    /// Build a Docker client for the configured connection mode.
    ///
    /// No request is sent here; an unreachable daemon only shows up on the first call.
    pub fn connect(config: &SessionConfig) -> Result<Self, SessionError> {
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        let connected = match &config.connection {
            ConnectionMode::LocalSocket => {
                Docker::connect_with_socket_defaults().map(|docker| docker.with_timeout(timeout))
            }
            ConnectionMode::Tcp { host, port } => {
                let endpoint = format!("{}:{}", host, port);
                Docker::connect_with_http(&endpoint, config.connect_timeout_secs, API_DEFAULT_VERSION)
            }
        };

        let docker = connected.map_err(|source| SessionError::Connect {
            endpoint: config.connection.describe(),
            source,
        })?;

        log::debug!(
            "Docker client configured for {}",
            config.connection.describe()
        );

        Ok(Self {
            docker,
            connection: config.connection.clone(),
        })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    fn connection(&self) -> &ConnectionMode {
        &self.connection
    }

    async fn pull_image(&self, image: &str) -> Result<(), DockerError> {
        let options = CreateImageOptions {
            from_image: Some(image.to_string()),
            ..Default::default()
        };

        let mut pull_stream = self.docker.create_image(Some(options), None, None);
        while let Some(result) = pull_stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = &info.status {
                        log::debug!("Image pull progress: {}", status);
                    }
                }
                Err(e) => {
                    log::debug!("Pull stream error: {}", e);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, DockerError> {
        let config = create_body(spec);

        let response = self
            .docker
            .create_container(None::<CreateContainerOptions>, config)
            .await?;

        for warning in &response.warnings {
            log::warn!("Docker warning creating container {}: {}", response.id, warning);
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .start_container(id, None::<StartContainerOptions>)
            .await
    }

    async fn kill_container(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .kill_container(id, None::<KillContainerOptions>)
            .await
    }

    async fn remove_container(&self, id: &str) -> Result<(), DockerError> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.docker.remove_container(id, Some(options)).await
    }

    async fn is_container_running(&self, id: &str) -> Result<bool, DockerError> {
        let inspect = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;

        Ok(inspect
            .state
            .and_then(|state| state.running)
            .unwrap_or(false))
    }
}

/// Create request for a session container: `<port>/tcp` exposed, bound to the
/// same host port, auto-remove as configured
fn create_body(spec: &ContainerSpec) -> ContainerCreateBody {
    let port_key = spec.port_key();

    let host_config = HostConfig {
        port_bindings: Some(HashMap::from([(
            port_key.clone(),
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(spec.host_port()),
            }]),
        )])),
        auto_remove: Some(spec.auto_remove),
        ..Default::default()
    };

    ContainerCreateBody {
        image: Some(spec.image.clone()),
        exposed_ports: Some(HashMap::from([(port_key, HashMap::new())])),
        host_config: Some(host_config),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::config::FREEROUTING_IMAGE;

    #[test]
    fn test_connect_over_tcp_is_lazy() {
        let config = SessionConfig {
            connection: ConnectionMode::default_tcp(),
            ..Default::default()
        };

        let runtime = DockerRuntime::connect(&config).expect("Should build TCP client");
        assert_eq!(runtime.connection(), &ConnectionMode::default_tcp());
    }

    #[test]
    fn test_create_body_publishes_session_port() {
        let spec = ContainerSpec::new(&SessionConfig::default(), 37500);
        let body = create_body(&spec);

        assert_eq!(body.image.as_deref(), Some(FREEROUTING_IMAGE));
        let exposed = body.exposed_ports.expect("exposed ports should be set");
        assert_eq!(exposed.len(), 1);
        assert!(exposed.contains_key("37500/tcp"));

        let host_config = body.host_config.expect("host config should be set");
        assert_eq!(host_config.auto_remove, Some(true));

        let bindings = host_config.port_bindings.expect("port bindings should be set");
        let binding = bindings["37500/tcp"]
            .as_ref()
            .expect("37500/tcp should be bound");
        assert_eq!(binding.len(), 1);
        assert_eq!(binding[0].host_port.as_deref(), Some("37500"));
    }

    #[test]
    fn test_create_body_honours_auto_remove_off() {
        let config = SessionConfig {
            auto_remove: false,
            ..Default::default()
        };
        let body = create_body(&ContainerSpec::new(&config, 8080));

        let host_config = body.host_config.expect("host config should be set");
        assert_eq!(host_config.auto_remove, Some(false));
        assert!(host_config
            .port_bindings
            .expect("port bindings should be set")
            .contains_key("8080/tcp"));
    }
}

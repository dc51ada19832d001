use bollard::errors::Error as DockerError;

/// Errors that can occur while bringing a session container up
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to connect to Docker daemon at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: DockerError,
    },
    #[error("Failed to pull image {image}: {source}")]
    Pull {
        image: String,
        #[source]
        source: DockerError,
    },
    #[error(
        "Docker must be running with the TCP socket enabled: go to Docker Desktop -> Settings -> General -> \
         enable \"Expose daemon on tcp://localhost:2375 without TLS\" (endpoint {endpoint})\n Error: {source}"
    )]
    TcpEndpointUnavailable {
        endpoint: String,
        #[source]
        source: DockerError,
    },
    #[error("Failed to start container: {source}")]
    Create {
        #[source]
        source: DockerError,
    },
    #[error("Failed to start container {id}: {source}")]
    Start {
        id: String,
        #[source]
        source: DockerError,
    },
}

/// Image pulled and run by every session
pub const FREEROUTING_IMAGE: &str = "ghcr.io/tscircuit/freerouting:master";

/// Address used when the daemon is reached over TCP
pub const DEFAULT_TCP_HOST: &str = "http://localhost";

/// Conventional unencrypted Docker daemon port
pub const DEFAULT_TCP_PORT: u16 = 2375;

/// How the runtime client reaches the Docker daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Platform default local socket (unix socket)
    LocalSocket,
    /// Plain HTTP over TCP. Has to be enabled on the daemon side by the operator.
    Tcp { host: String, port: u16 },
}

impl ConnectionMode {
    /// Pick the connection mode for the current host.
    ///
    /// Windows has no default socket we can use, so it goes through the daemon's
    /// TCP endpoint on localhost:2375. Every other OS uses the local socket.
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Self::default_tcp()
        } else {
            Self::LocalSocket
        }
    }

    pub fn default_tcp() -> Self {
        Self::Tcp {
            host: DEFAULT_TCP_HOST.to_string(),
            port: DEFAULT_TCP_PORT,
        }
    }

    pub fn is_tcp(&self) -> bool {
        matches!(self, Self::Tcp { .. })
    }

    /// Full TCP address of the daemon, `None` for the local socket
    pub fn endpoint(&self) -> Option<String> {
        match self {
            Self::LocalSocket => None,
            Self::Tcp { host, port } => Some(format!("{}:{}", host, port)),
        }
    }

    /// Human readable description used in logs and errors
    pub fn describe(&self) -> String {
        self.endpoint()
            .unwrap_or_else(|| "local docker socket".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub image: String,
    pub connection: ConnectionMode,
    /// Request timeout handed to the Docker client, in seconds
    pub connect_timeout_secs: u64,
    /// Let the daemon delete the container once it stops
    pub auto_remove: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            image: FREEROUTING_IMAGE.to_string(),
            connection: ConnectionMode::for_host(),
            connect_timeout_secs: 120,
            auto_remove: true,
        }
    }
}

/// Everything the daemon needs to create one session container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub port: u16,
    pub auto_remove: bool,
}

impl ContainerSpec {
    pub fn new(config: &SessionConfig, port: u16) -> Self {
        Self {
            image: config.image.clone(),
            port,
            auto_remove: config.auto_remove,
        }
    }

    /// Key used for both `ExposedPorts` and `PortBindings`, e.g. `37500/tcp`
    pub fn port_key(&self) -> String {
        format!("{}/tcp", self.port)
    }

    /// Host side of the binding. Same number as the container port.
    pub fn host_port(&self) -> String {
        self.port.to_string()
    }
}

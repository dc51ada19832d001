//! Container management module
//!
//! This module owns the lifecycle of the single freerouting container a session
//! runs: pulling the image, creating and starting the container with its port
//! published, polling its state and killing it again.

pub mod config;
pub mod runtime;
pub mod session;

// Re-export commonly used items for convenience
pub use config::{
    ConnectionMode, ContainerSpec, SessionConfig, DEFAULT_TCP_HOST, DEFAULT_TCP_PORT,
    FREEROUTING_IMAGE,
};
pub use runtime::{ContainerRuntime, DockerRuntime};
pub use session::ContainerSession;

pub mod container;
pub mod error;

pub use container::{
    ConnectionMode, ContainerRuntime, ContainerSession, ContainerSpec, DockerRuntime,
    SessionConfig, FREEROUTING_IMAGE,
};
pub use error::SessionError;

//! Container rebuilding -- derive a creation spec from an existing container.
//!
//! [`rebuild_spec`] copies the old container's name, command, entrypoint,
//! environment, labels and host configuration verbatim and substitutes only
//! the image reference. Nothing is inferred or defaulted, so the replacement
//! runs with the same runtime configuration as the original.

use std::collections::HashMap;

use bollard::container::{Config, CreateContainerOptions};
use bollard::models::HostConfig;

use crate::types::ContainerSnapshot;

/// Everything needed to create the replacement container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    /// Bare container name (no leading `/`).
    pub name: String,
    /// Image reference to run.
    pub image: String,
    pub cmd: Option<Vec<String>>,
    pub entrypoint: Option<Vec<String>>,
    pub env: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
    pub host_config: Option<HostConfig>,
}

impl ContainerSpec {
    /// Converts into the bollard create-container arguments.
    pub fn to_create_args(&self) -> (CreateContainerOptions<String>, Config<String>) {
        let options = CreateContainerOptions {
            name: self.name.clone(),
            platform: None,
        };
        let config = Config {
            image: Some(self.image.clone()),
            cmd: self.cmd.clone(),
            entrypoint: self.entrypoint.clone(),
            env: self.env.clone(),
            labels: self.labels.clone(),
            host_config: self.host_config.clone(),
            ..Default::default()
        };
        (options, config)
    }
}

/// Builds the creation spec for a replacement of `old` running `image`.
pub fn rebuild_spec(old: &ContainerSnapshot, image: &str) -> ContainerSpec {
    ContainerSpec {
        name: old.bare_name().to_owned(),
        image: image.to_owned(),
        cmd: old.cmd.clone(),
        entrypoint: old.entrypoint.clone(),
        env: old.env.clone(),
        labels: old.labels.clone(),
        host_config: old.host_config.clone(),
    }
}

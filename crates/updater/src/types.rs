//! Container snapshots and pull credentials.
//!
//! A [`ContainerSnapshot`] is taken once per pass from the engine's inspect
//! output and never mutated afterwards. Lifecycle operations address the
//! container through [`ContainerSnapshot::id`].

use std::collections::HashMap;
use std::fmt;

use bollard::models::{ContainerInspectResponse, HostConfig};
use serde::Serialize;

use crate::error::{EngineStep, UpdaterError};

/// Inspected state of a running container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSnapshot {
    /// Engine container ID (handle for stop/remove).
    pub id: String,
    /// Name as reported by the engine, possibly with a leading `/`.
    pub name: String,
    /// Image reference the container was created from (e.g. `nginx:latest`).
    pub image: String,
    /// ID of the image the container is actually running.
    pub image_id: Option<String>,
    pub cmd: Option<Vec<String>>,
    pub entrypoint: Option<Vec<String>>,
    pub env: Option<Vec<String>>,
    pub labels: Option<HashMap<String, String>>,
    /// Host configuration (volumes, network mode, ports, restart policy, ...).
    pub host_config: Option<HostConfig>,
}

impl ContainerSnapshot {
    /// Name with the engine-assigned leading `/` stripped.
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }

    /// Builds a snapshot from a bollard inspect response.
    ///
    /// # Errors
    ///
    /// Returns `UpdaterError::EngineCall` if the response has no container ID
    /// or no configured image reference.
    pub fn from_inspect(details: ContainerInspectResponse) -> Result<Self, UpdaterError> {
        let id = details
            .id
            .ok_or_else(|| UpdaterError::engine(EngineStep::List, "<unknown>", "missing container id"))?;
        let config = details.config.unwrap_or_default();
        let image = config
            .image
            .ok_or_else(|| UpdaterError::engine(EngineStep::List, &id, "missing image reference"))?;

        Ok(Self {
            name: details.name.unwrap_or_default(),
            image,
            image_id: details.image,
            cmd: config.cmd,
            entrypoint: config.entrypoint,
            env: config.env,
            labels: config.labels,
            host_config: details.host_config,
            id,
        })
    }
}

/// Registry credentials attached to a pull.
#[derive(Clone, PartialEq, Eq)]
pub struct PullCredentials {
    pub username: String,
    pub password: String,
}

impl PullCredentials {
    /// Returns credentials only when both parts are present and non-empty.
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some(Self {
                username: user.to_owned(),
                password: pass.to_owned(),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for PullCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

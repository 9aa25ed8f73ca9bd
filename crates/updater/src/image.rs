//! Image descriptors and update detection.
//!
//! Two images are the same build exactly when their content-derived IDs match.
//! Tags are informational only: a re-tag of the same build is not an update,
//! and the same tag pointing at a new build is.

use bollard::models::ImageInspect;
use serde::Serialize;

/// Identity and tags of a local image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDescriptor {
    /// Content-derived image ID (`sha256:...`).
    pub id: String,
    pub repo_tags: Vec<String>,
}

impl ImageDescriptor {
    pub fn new(id: impl Into<String>, repo_tags: Vec<String>) -> Self {
        Self {
            id: id.into(),
            repo_tags,
        }
    }

    /// Converts a bollard inspect result, returning `None` when the engine
    /// reported no ID.
    pub fn from_inspect(inspect: ImageInspect) -> Option<Self> {
        let id = inspect.id.filter(|id| !id.is_empty())?;
        Some(Self {
            id,
            repo_tags: inspect.repo_tags.unwrap_or_default(),
        })
    }
}

/// Reports whether `latest` is a different build than `current`.
///
/// A missing `latest` (failed or skipped pull) is never an update.
pub fn is_updated(current: &ImageDescriptor, latest: Option<&ImageDescriptor>) -> bool {
    latest.is_some_and(|latest| latest.id != current.id)
}

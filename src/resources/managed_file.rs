//! Files whose whole content is owned by the provisioner.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::helpers::fs::ensure_parent_dir;
use super::{Resource, ResourceChange, ResourceState};

/// A file overwritten with fixed content whenever it differs.
#[derive(Debug)]
pub struct ManagedFileResource {
    /// Destination path.
    pub path: PathBuf,
    /// Desired file content.
    pub content: String,
}

impl ManagedFileResource {
    /// Create a new managed file resource.
    #[must_use]
    pub fn new(path: &Path, content: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            content: content.to_string(),
        }
    }
}

impl Resource for ManagedFileResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn current_state(&self) -> Result<ResourceState> {
        match std::fs::read_to_string(&self.path) {
            Ok(current) if current == self.content => Ok(ResourceState::Correct),
            Ok(_) => Ok(ResourceState::Incorrect {
                current: "content differs".to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.path)?;
        std::fs::write(&self.path, &self.content)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }
}

//! A git repository cloned into a fixed destination.
use anyhow::Result;
use std::path::{Path, PathBuf};

use super::helpers::fs::{ensure_parent_dir, is_non_empty_dir};
use super::{Resource, ResourceChange, ResourceState};
use crate::exec::{CommandSpec, Executor};

/// A shallow clone of `url` at `dest`.
///
/// Existing checkouts are never touched: a git work tree at `dest` counts as
/// correct, and any other non-empty directory is left alone as invalid.
#[derive(Debug)]
pub struct GitCloneResource<'a> {
    /// Remote repository URL.
    pub url: String,
    /// Clone destination.
    pub dest: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> GitCloneResource<'a> {
    /// Create a new clone resource.
    #[must_use]
    pub fn new(url: &str, dest: &Path, executor: &'a dyn Executor) -> Self {
        Self {
            url: url.to_string(),
            dest: dest.to_path_buf(),
            executor,
        }
    }
}

impl Resource for GitCloneResource<'_> {
    fn description(&self) -> String {
        format!("{} → {}", self.url, self.dest.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.dest.join(".git").exists() {
            return Ok(ResourceState::Correct);
        }
        if self.dest.exists() && !self.dest.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a directory", self.dest.display()),
            });
        }
        if is_non_empty_dir(&self.dest) {
            return Ok(ResourceState::Invalid {
                reason: format!(
                    "{} already exists and is not a git checkout",
                    self.dest.display()
                ),
            });
        }
        Ok(ResourceState::Missing)
    }

    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.dest)?;
        let dest = self.dest.display().to_string();
        let cmd = CommandSpec::new(
            "git",
            &["clone", "--depth", "1", self.url.as_str(), dest.as_str()],
        );
        self.executor.run_attached(&cmd)?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    const URL: &str = "https://example.com/editor-config.git";

    #[test]
    fn missing_destination_is_missing() {
        let home = tempfile::tempdir().unwrap();
        let executor = MockExecutor::ok("");
        let resource = GitCloneResource::new(URL, &home.path().join(".config/nvim"), &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn empty_destination_is_missing() {
        let home = tempfile::tempdir().unwrap();
        let dest = home.path().join("nvim");
        std::fs::create_dir(&dest).unwrap();
        let executor = MockExecutor::ok("");
        let resource = GitCloneResource::new(URL, &dest, &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn existing_checkout_is_correct() {
        let home = tempfile::tempdir().unwrap();
        let dest = home.path().join("nvim");
        std::fs::create_dir_all(dest.join(".git")).unwrap();
        let executor = MockExecutor::ok("");
        let resource = GitCloneResource::new(URL, &dest, &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Correct);
    }

    #[test]
    fn foreign_directory_is_invalid() {
        let home = tempfile::tempdir().unwrap();
        let dest = home.path().join("nvim");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("init.lua"), "-- mine").unwrap();
        let executor = MockExecutor::ok("");
        let resource = GitCloneResource::new(URL, &dest, &executor);
        assert!(matches!(
            resource.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
    }

    #[test]
    fn apply_clones_shallowly_and_creates_parent() {
        let home = tempfile::tempdir().unwrap();
        let dest = home.path().join(".config/nvim");
        let executor = MockExecutor::ok("");
        let resource = GitCloneResource::new(URL, &dest, &executor);
        resource.apply().unwrap();
        assert!(home.path().join(".config").is_dir());
        assert_eq!(
            executor.calls(),
            vec![format!("git clone --depth 1 {URL} {}", dest.display())]
        );
    }
}

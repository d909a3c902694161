//! Global git configuration entries.
use anyhow::Result;

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// A `git config --global` entry that is read before it is written.
#[derive(Debug)]
pub struct GitConfigResource<'a> {
    /// Config key (e.g., "user.name").
    pub key: String,
    /// Desired value.
    pub desired_value: String,
    executor: &'a dyn Executor,
}

impl<'a> GitConfigResource<'a> {
    /// Create a new git config resource.
    #[must_use]
    pub fn new(key: &str, desired_value: &str, executor: &'a dyn Executor) -> Self {
        Self {
            key: key.to_string(),
            desired_value: desired_value.to_string(),
            executor,
        }
    }
}

impl Resource for GitConfigResource<'_> {
    fn description(&self) -> String {
        format!("git {} = {}", self.key, self.desired_value)
    }

    fn current_state(&self) -> Result<ResourceState> {
        // Exit status 1 means "key not set"; anything else is an answer.
        let result = self
            .executor
            .run_unchecked("git", &["config", "--global", "--get", &self.key])?;
        let current = result.stdout.trim();

        if !result.success || current.is_empty() {
            Ok(ResourceState::Missing)
        } else if current == self.desired_value {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: current.to_string(),
            })
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.executor.run(
            "git",
            &["config", "--global", &self.key, &self.desired_value],
        )?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn current_state_reads_before_writing() {
        let executor = MockExecutor::ok("Ada\n");
        let resource = GitConfigResource::new("user.name", "Ada", &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(executor.calls(), vec!["git config --global --get user.name"]);
    }

    #[test]
    fn unset_key_is_missing() {
        let executor = MockExecutor::fail();
        let resource = GitConfigResource::new("user.email", "ada@example.com", &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn different_value_is_incorrect() {
        let executor = MockExecutor::ok("someone@else\n");
        let resource = GitConfigResource::new("user.email", "ada@example.com", &executor);
        assert_eq!(
            resource.current_state().unwrap(),
            ResourceState::Incorrect {
                current: "someone@else".to_string()
            }
        );
    }

    #[test]
    fn apply_sets_value_with_spaces_as_one_argument() {
        let executor = MockExecutor::ok("");
        let resource = GitConfigResource::new("user.name", "Ada Lovelace", &executor);
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(
            executor.calls(),
            vec!["git config --global user.name Ada Lovelace"]
        );
    }
}

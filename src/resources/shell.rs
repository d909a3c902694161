//! Default login shell.
use anyhow::{Context as _, Result};

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::{CommandSpec, Executor};

/// A resource for configuring a user's default login shell.
#[derive(Debug)]
pub struct DefaultShellResource<'a> {
    /// Target shell name (e.g., "zsh").
    target_shell: String,
    /// Account whose login shell is changed.
    user: String,
    /// Privilege wrapper for `chsh`, if any.
    wrapper: Option<&'a str>,
    /// Executor for running system commands.
    executor: &'a dyn Executor,
}

impl<'a> DefaultShellResource<'a> {
    /// Create a new default shell resource.
    #[must_use]
    pub fn new(
        target_shell: &str,
        user: &str,
        wrapper: Option<&'a str>,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            target_shell: target_shell.to_string(),
            user: user.to_string(),
            wrapper,
            executor,
        }
    }

    /// The user's current login shell from the account database, falling
    /// back to `$SHELL` when `getent` is unavailable.
    fn login_shell(&self) -> Result<String> {
        let result = self
            .executor
            .run_unchecked("getent", &["passwd", &self.user])?;
        if result.success
            && let Some(shell) = result.stdout.trim().rsplit(':').next()
        {
            return Ok(shell.to_string());
        }
        Ok(std::env::var("SHELL").unwrap_or_default())
    }

    /// Absolute path of the target shell.
    fn shell_path(&self) -> Result<String> {
        let result = self
            .executor
            .run("sh", &["-c", "command -v \"$1\"", "sh", &self.target_shell])
            .with_context(|| format!("{} is not installed", self.target_shell))?;
        Ok(result.stdout.trim().to_string())
    }
}

impl Resource for DefaultShellResource<'_> {
    fn description(&self) -> String {
        format!("default shell for {} → {}", self.user, self.target_shell)
    }

    fn current_state(&self) -> Result<ResourceState> {
        let current_shell = self.login_shell()?;
        let suffix = format!("/{}", self.target_shell);

        if current_shell.ends_with(&suffix) {
            Ok(ResourceState::Correct)
        } else if current_shell.is_empty() {
            Ok(ResourceState::Missing)
        } else {
            Ok(ResourceState::Incorrect {
                current: current_shell,
            })
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        let shell_path = self.shell_path()?;
        let cmd = CommandSpec::new("chsh", &["-s", shell_path.as_str(), self.user.as_str()])
            .wrapped(self.wrapper);
        self.executor.run_attached(&cmd)?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    const PASSWD_ZSH: &str = "dev:x:1000:1000:Dev:/home/dev:/usr/bin/zsh\n";
    const PASSWD_BASH: &str = "dev:x:1000:1000:Dev:/home/dev:/bin/bash\n";

    #[test]
    fn description_includes_user_and_shell() {
        let executor = MockExecutor::ok("");
        let resource = DefaultShellResource::new("zsh", "dev", None, &executor);
        assert_eq!(resource.description(), "default shell for dev → zsh");
    }

    #[test]
    fn current_state_correct_when_login_shell_matches() {
        let executor = MockExecutor::ok(PASSWD_ZSH);
        let resource = DefaultShellResource::new("zsh", "dev", None, &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(executor.calls(), vec!["getent passwd dev"]);
    }

    #[test]
    fn current_state_incorrect_when_different_shell_set() {
        let executor = MockExecutor::ok(PASSWD_BASH);
        let resource = DefaultShellResource::new("zsh", "dev", None, &executor);
        let state = resource.current_state().unwrap();
        assert!(
            matches!(state, ResourceState::Incorrect { ref current } if current == "/bin/bash"),
            "expected Incorrect(/bin/bash), got {state:?}"
        );
    }

    #[test]
    fn apply_resolves_path_and_wraps_chsh() {
        let executor = MockExecutor::with_responses(vec![
            (true, "/usr/bin/zsh\n".to_string()),
            (true, String::new()),
        ]);
        let resource = DefaultShellResource::new("zsh", "dev", Some("sudo"), &executor);
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        let calls = executor.calls();
        assert_eq!(calls[1], "sudo chsh -s /usr/bin/zsh dev");
    }

    #[test]
    fn apply_fails_when_shell_not_installed() {
        let executor = MockExecutor::fail();
        let resource = DefaultShellResource::new("zsh", "dev", None, &executor);
        let err = resource.apply().unwrap_err();
        assert!(err.to_string().contains("zsh is not installed"));
        assert_eq!(executor.calls().len(), 1, "chsh must not run");
    }
}

//! Global git author identity.
use anyhow::Result;

use super::{Context, Step, StepResult, process_resources};
use crate::resources::git_config::GitConfigResource;

/// Set the global git author identity.
#[derive(Debug)]
pub struct ConfigureGitIdentity;

impl Step for ConfigureGitIdentity {
    fn name(&self) -> &'static str {
        "Configure git identity"
    }

    fn question(&self, ctx: &Context) -> String {
        let git = &ctx.settings.git;
        format!("Set git identity to {} <{}>?", git.name, git.email)
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let git = &ctx.settings.git;
        let resources = [
            GitConfigResource::new("user.name", &git.name, &*ctx.user_executor),
            GitConfigResource::new("user.email", &git.email, &*ctx.user_executor),
        ];
        let stats = process_resources(ctx, resources, "set")?;
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::platform::Distro;
    use crate::resources::test_helpers::MockExecutor;
    use crate::steps::test_helpers::{FakeFetcher, StepTestEnv, step_env, yes_prompter};

    fn env_with(responses: Vec<(bool, &str)>, dry_run: bool) -> StepTestEnv {
        step_env(
            Distro::Fedora,
            MockExecutor::with_responses(
                responses
                    .into_iter()
                    .map(|(ok, out)| (ok, out.to_string()))
                    .collect(),
            ),
            FakeFetcher::default(),
            yes_prompter(),
            dry_run,
        )
    }

    #[test]
    fn sets_missing_values_without_sudo() {
        let env = env_with(vec![(false, ""), (true, ""), (false, ""), (true, "")], false);
        let result = ConfigureGitIdentity.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::Ok);
        assert_eq!(
            env.executor.calls(),
            vec![
                "git config --global --get user.name",
                "git config --global user.name Workstation Owner",
                "git config --global --get user.email",
                "git config --global user.email owner@localhost",
            ]
        );
    }

    #[test]
    fn matching_identity_is_not_rewritten() {
        let env = env_with(
            vec![(true, "Workstation Owner\n"), (true, "owner@localhost\n")],
            false,
        );
        let result = ConfigureGitIdentity.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::Skipped("already configured".to_string()));
        assert_eq!(env.executor.calls().len(), 2);
    }

    #[test]
    fn dry_run_only_reads() {
        let env = env_with(vec![(true, "Someone Else\n"), (false, "")], true);
        let result = ConfigureGitIdentity.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::DryRun);
        assert!(
            env.executor
                .calls()
                .iter()
                .all(|c| c.starts_with("git config --global --get"))
        );
    }

    #[test]
    fn writes_the_invoking_users_config_under_sudo() {
        let env = crate::steps::test_helpers::owned_env(Distro::Fedora);
        ConfigureGitIdentity.run(&env.ctx).unwrap();
        let home = env.home().display().to_string();
        let prefix = format!("sudo -u dev env HOME={home} git config --global ");
        let calls = env.executor.calls();
        assert_eq!(calls.len(), 4, "{calls:?}");
        assert!(calls.iter().all(|c| c.starts_with(&prefix)), "{calls:?}");
    }

    #[test]
    fn never_clones_anything() {
        let env = env_with(vec![(false, ""), (true, ""), (false, ""), (true, "")], false);
        ConfigureGitIdentity.run(&env.ctx).unwrap();
        assert!(!env.executor.calls().iter().any(|c| c.contains("clone")));
    }
}

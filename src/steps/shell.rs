//! Login shell of the target user.
use anyhow::Result;

use super::{Context, Step, StepResult, process_resources};
use crate::resources::shell::DefaultShellResource;

/// Make the configured shell the login shell of the target user.
#[derive(Debug)]
pub struct SetDefaultShell;

impl Step for SetDefaultShell {
    fn name(&self) -> &'static str {
        "Set default shell"
    }

    fn question(&self, ctx: &Context) -> String {
        format!(
            "Set {} as the default shell for {}?",
            ctx.settings.shell.name, ctx.user
        )
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let resource = DefaultShellResource::new(
            &ctx.settings.shell.name,
            &ctx.user,
            ctx.privilege.wrapper,
            &*ctx.executor,
        );
        let stats = process_resources(ctx, [resource], "set")?;
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::platform::Distro;
    use crate::resources::test_helpers::MockExecutor;
    use crate::steps::test_helpers::{FakeFetcher, step_env, yes_prompter};

    fn env_with(
        responses: Vec<(bool, &str)>,
        dry_run: bool,
    ) -> crate::steps::test_helpers::StepTestEnv {
        let responses = responses
            .into_iter()
            .map(|(ok, out)| (ok, out.to_string()))
            .collect();
        step_env(
            Distro::Fedora,
            MockExecutor::with_responses(responses),
            FakeFetcher::default(),
            yes_prompter(),
            dry_run,
        )
    }

    #[test]
    fn already_zsh_is_a_no_op() {
        let env = env_with(vec![(true, "dev:x:1000:1000::/home/dev:/usr/bin/zsh")], false);
        let result = SetDefaultShell.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::Skipped("already configured".to_string()));
        assert_eq!(env.executor.calls(), vec!["getent passwd dev"]);
    }

    #[test]
    fn changes_shell_through_sudo() {
        let env = env_with(
            vec![
                (true, "dev:x:1000:1000::/home/dev:/bin/bash"),
                (true, "/usr/bin/zsh"),
                (true, ""),
            ],
            false,
        );
        let result = SetDefaultShell.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::Ok);
        assert_eq!(env.executor.calls()[2], "sudo chsh -s /usr/bin/zsh dev");
    }

    #[test]
    fn dry_run_only_reads_state() {
        let env = env_with(vec![(true, "dev:x:1000:1000::/home/dev:/bin/bash")], true);
        let result = SetDefaultShell.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::DryRun);
        assert_eq!(env.executor.calls().len(), 1);
    }
}

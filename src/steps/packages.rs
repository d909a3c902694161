//! The development package list.
use anyhow::Result;

use super::{Context, Step, StepResult};

/// Install the development package list in one package-manager batch.
#[derive(Debug)]
pub struct InstallDevPackages;

impl Step for InstallDevPackages {
    fn name(&self) -> &'static str {
        "Install development packages"
    }

    fn question(&self, ctx: &Context) -> String {
        let count = ctx.settings.packages_for(ctx.profile.id).len();
        format!(
            "Install development packages ({count} packages via {})?",
            ctx.profile.package_manager
        )
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let packages = ctx.settings.packages_for(ctx.profile.id);
        ctx.log.debug(&format!("packages: {}", packages.join(" ")));
        ctx.install_packages(&packages)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::platform::Distro;
    use crate::steps::baseline::InstallBaselineTools;
    use crate::steps::test_helpers::permissive_env;

    #[test]
    fn installs_whole_list_in_one_call() {
        let env = permissive_env(Distro::Arch, false);
        InstallDevPackages.run(&env.ctx).unwrap();
        let calls = env.executor.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("sudo pacman -S --needed --noconfirm base-devel cmake"));
        assert!(calls[0].ends_with(" npm"));
    }

    #[test]
    fn ubuntu_index_refreshed_once_across_steps() {
        let env = permissive_env(Distro::Ubuntu, false);
        InstallBaselineTools.run(&env.ctx).unwrap();
        InstallDevPackages.run(&env.ctx).unwrap();
        let updates = env
            .executor
            .calls()
            .iter()
            .filter(|c| c.as_str() == "sudo apt-get update")
            .count();
        assert_eq!(updates, 1);
    }

    #[test]
    fn failed_install_is_an_error() {
        use crate::resources::test_helpers::MockExecutor;
        use crate::steps::test_helpers::{FakeFetcher, step_env, yes_prompter};

        let env = step_env(
            Distro::Fedora,
            MockExecutor::fail(),
            FakeFetcher::default(),
            yes_prompter(),
            false,
        );
        assert!(InstallDevPackages.run(&env.ctx).is_err());
    }

    #[test]
    fn question_names_the_manager() {
        let env = permissive_env(Distro::Fedora, false);
        let question = InstallDevPackages.question(&env.ctx);
        assert!(question.contains("via dnf"), "{question}");
    }
}

//! Baseline network and version-control clients.
use anyhow::Result;

use super::{Context, Step, StepResult};
use crate::config::packages::BASELINE_TOOLS;

/// Install the network and version-control clients every later step relies on.
#[derive(Debug)]
pub struct InstallBaselineTools;

impl Step for InstallBaselineTools {
    fn name(&self) -> &'static str {
        "Install baseline tools"
    }

    fn question(&self, _ctx: &Context) -> String {
        format!("Install baseline tools ({})?", BASELINE_TOOLS.join(", "))
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        ctx.install_packages(BASELINE_TOOLS)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Distro;
    use crate::steps::test_helpers::permissive_env;

    #[test]
    fn fedora_installs_with_single_dnf_call() {
        let env = permissive_env(Distro::Fedora, false);
        let result = InstallBaselineTools.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::Ok);
        assert_eq!(env.executor.calls(), vec!["sudo dnf install -y curl git"]);
    }

    #[test]
    fn ubuntu_refreshes_index_first() {
        let env = permissive_env(Distro::Ubuntu, false);
        InstallBaselineTools.run(&env.ctx).unwrap();
        assert_eq!(
            env.executor.calls(),
            vec!["sudo apt-get update", "sudo apt-get install -y curl git"]
        );
    }

    #[test]
    fn arch_uses_needed_and_noconfirm() {
        let env = permissive_env(Distro::Arch, false);
        InstallBaselineTools.run(&env.ctx).unwrap();
        assert_eq!(
            env.executor.calls(),
            vec!["sudo pacman -S --needed --noconfirm curl git"]
        );
    }

    #[test]
    fn dry_run_runs_nothing() {
        let env = permissive_env(Distro::Fedora, true);
        let result = InstallBaselineTools.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::DryRun);
        assert!(env.executor.calls().is_empty());
    }

    #[test]
    fn question_lists_the_tools() {
        let env = permissive_env(Distro::Fedora, false);
        assert_eq!(
            InstallBaselineTools.question(&env.ctx),
            "Install baseline tools (curl, git)?"
        );
    }
}

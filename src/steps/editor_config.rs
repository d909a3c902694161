//! Clone the Neovim configuration repository.
use anyhow::{Context as _, Result};

use super::{Context, Step, StepResult, process_resources, step_deps};
use crate::resources::repository::GitCloneResource;

/// Clone the editor configuration repository into `~/.config/nvim`.
#[derive(Debug)]
pub struct CloneEditorConfig;

impl Step for CloneEditorConfig {
    fn name(&self) -> &'static str {
        "Clone Neovim configuration"
    }

    step_deps![super::editor::BuildEditor];

    fn question(&self, ctx: &Context) -> String {
        format!(
            "Clone {} into ~/.config/nvim?",
            ctx.settings.editor.config_repo
        )
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let config_dir = ctx.home.join(".config");
        let dest = config_dir.join("nvim");
        if !ctx.dry_run && !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .with_context(|| format!("creating {}", config_dir.display()))?;
            ctx.hand_over(&config_dir)?;
        }
        let resource =
            GitCloneResource::new(&ctx.settings.editor.config_repo, &dest, &*ctx.user_executor);
        let stats = process_resources(ctx, [resource], "clone")?;
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Distro;
    use crate::steps::test_helpers::permissive_env;

    #[test]
    fn clones_into_config_dir_without_sudo() {
        let env = permissive_env(Distro::Ubuntu, false);
        let result = CloneEditorConfig.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::Ok);
        let dest = env.home().join(".config/nvim");
        assert_eq!(
            env.executor.calls(),
            vec![format!(
                "git clone --depth 1 https://github.com/nvim-lua/kickstart.nvim.git {}",
                dest.display()
            )]
        );
        assert!(env.home().join(".config").is_dir(), "parent is created");
    }

    #[test]
    fn clones_as_invoking_user_under_sudo() {
        let env = crate::steps::test_helpers::owned_env(Distro::Ubuntu);
        CloneEditorConfig.run(&env.ctx).unwrap();
        let prefix = format!("sudo -u dev env HOME={} git clone ", env.home().display());
        let calls = env.executor.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls.first().unwrap().starts_with(&prefix), "{calls:?}");
    }

    #[test]
    fn existing_checkout_is_left_alone() {
        let env = permissive_env(Distro::Ubuntu, false);
        std::fs::create_dir_all(env.home().join(".config/nvim/.git")).unwrap();
        let result = CloneEditorConfig.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::Skipped("already configured".to_string()));
        assert!(env.executor.calls().is_empty());
    }

    #[test]
    fn foreign_directory_is_skipped() {
        let env = permissive_env(Distro::Ubuntu, false);
        let dest = env.home().join(".config/nvim");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("init.lua"), "-- mine").unwrap();
        let result = CloneEditorConfig.run(&env.ctx).unwrap();
        assert_eq!(
            result,
            StepResult::Skipped("left existing files alone".to_string())
        );
        assert!(env.executor.calls().is_empty());
    }

    #[test]
    fn depends_on_editor_build() {
        assert_eq!(
            CloneEditorConfig.dependencies(),
            &[std::any::TypeId::of::<crate::steps::editor::BuildEditor>()]
        );
    }
}

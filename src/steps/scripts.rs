//! Helper scripts directory and its `PATH` entry in `~/.zshrc`.
use anyhow::{Context as _, Result};

use super::{Context, Step, StepResult, StepStats, process_resources};
use crate::resources::path_line::LineInFileResource;

/// Create the personal scripts directory and put it on `PATH` in the shell
/// startup file.
#[derive(Debug)]
pub struct AddScriptsToPath;

impl Step for AddScriptsToPath {
    fn name(&self) -> &'static str {
        "Add scripts directory to PATH"
    }

    fn question(&self, ctx: &Context) -> String {
        format!(
            "Create ~/{} and add it to PATH in ~/{}?",
            ctx.settings.shell.scripts_dir, ctx.settings.shell.rc_file
        )
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let dir = ctx.home.join(&ctx.settings.shell.scripts_dir);
        let mut stats = StepStats::default();

        if dir.is_dir() {
            ctx.log.info(&format!("ok: {}", dir.display()));
            stats.already_ok += 1;
        } else if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would create directory {}", dir.display()));
            stats.changed += 1;
        } else {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            ctx.hand_over(&dir)?;
            ctx.log.info(&format!("created {}", dir.display()));
            stats.changed += 1;
        }

        let rc = ctx.home.join(&ctx.settings.shell.rc_file);
        let line = LineInFileResource::path_export(&dir, &ctx.home);
        stats += process_resources(ctx, [LineInFileResource::new(&rc, &line)], "add")?;
        if !ctx.dry_run {
            ctx.hand_over(&rc)?;
        }
        Ok(stats.finish(ctx))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::Distro;
    use crate::steps::test_helpers::permissive_env;

    const EXPORT: &str = "export PATH=\"$HOME/scripts:$PATH\"";

    fn export_count(rc: &std::path::Path) -> usize {
        std::fs::read_to_string(rc)
            .unwrap()
            .lines()
            .filter(|l| l.trim() == EXPORT)
            .count()
    }

    #[test]
    fn creates_directory_and_line() {
        let env = permissive_env(Distro::Arch, false);
        let result = AddScriptsToPath.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::Ok);
        assert!(env.home().join("scripts").is_dir());
        assert_eq!(export_count(&env.home().join(".zshrc")), 1);
        assert!(env.executor.calls().is_empty(), "no external command runs");
    }

    #[test]
    fn running_twice_keeps_a_single_line() {
        let env = permissive_env(Distro::Arch, false);
        AddScriptsToPath.run(&env.ctx).unwrap();
        let second = AddScriptsToPath.run(&env.ctx).unwrap();
        assert_eq!(second, StepResult::Skipped("already configured".to_string()));
        assert_eq!(export_count(&env.home().join(".zshrc")), 1);
    }

    #[test]
    fn existing_rc_content_is_preserved() {
        let env = permissive_env(Distro::Arch, false);
        let rc = env.home().join(".zshrc");
        std::fs::write(&rc, "alias ll='ls -l'").unwrap();
        AddScriptsToPath.run(&env.ctx).unwrap();
        let content = std::fs::read_to_string(&rc).unwrap();
        assert!(content.starts_with("alias ll='ls -l'\n"));
        assert!(content.ends_with(&format!("{EXPORT}\n")));
    }

    #[test]
    fn created_files_belong_to_the_invoking_user_under_sudo() {
        use std::os::unix::fs::MetadataExt;

        let env = crate::steps::test_helpers::owned_env(Distro::Arch);
        AddScriptsToPath.run(&env.ctx).unwrap();
        let owner = crate::steps::test_helpers::current_owner();
        for path in [env.home().join("scripts"), env.home().join(".zshrc")] {
            let meta = std::fs::metadata(&path).unwrap();
            assert_eq!((meta.uid(), meta.gid()), (owner.uid, owner.gid), "{path:?}");
        }
    }

    #[test]
    fn dry_run_touches_nothing() {
        let env = permissive_env(Distro::Arch, true);
        let result = AddScriptsToPath.run(&env.ctx).unwrap();
        assert_eq!(result, StepResult::DryRun);
        assert!(!env.home().join("scripts").exists());
        assert!(!env.home().join(".zshrc").exists());
    }
}

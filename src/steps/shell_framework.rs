//! Oh My Zsh and the powerlevel10k theme.
use anyhow::{Context as _, Result};

use super::{Context, Step, StepResult, StepStats, process_resources};
use crate::exec::CommandSpec;
use crate::resources::helpers::fs::remove_path;
use crate::resources::managed_file::ManagedFileResource;

/// Installer script location under the work root.
const INSTALLER_NAME: &str = "provision-ohmyzsh-install.sh";

/// Prompt written over the framework theme: user, host and directory, with
/// the git branch in brackets when inside a work tree.
const THEME: &str = r#"# Managed by provision; local edits are overwritten.
local ret_status="%(?:%{$fg_bold[green]%}➜ :%{$fg_bold[red]%}➜ )"

PROMPT='${ret_status}%{$fg[cyan]%}%n@%m%{$reset_color%} %{$fg_bold[blue]%}%~%{$reset_color%} $(git_prompt_info)'

ZSH_THEME_GIT_PROMPT_PREFIX="%{$fg_bold[yellow]%}["
ZSH_THEME_GIT_PROMPT_SUFFIX="]%{$reset_color%} "
ZSH_THEME_GIT_PROMPT_DIRTY="%{$fg[red]%}*%{$fg_bold[yellow]%}"
ZSH_THEME_GIT_PROMPT_CLEAN=""
"#;

/// Install oh-my-zsh through its bootstrap script, then overwrite the
/// configured theme with the bundled prompt.
#[derive(Debug)]
pub struct InstallShellFramework;

impl Step for InstallShellFramework {
    fn name(&self) -> &'static str {
        "Install oh-my-zsh"
    }

    fn question(&self, ctx: &Context) -> String {
        format!(
            "Install oh-my-zsh and overwrite the {} theme?",
            ctx.settings.shell.theme
        )
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let framework_dir = ctx.home.join(".oh-my-zsh");
        let mut stats = StepStats::default();

        if framework_dir.exists() {
            ctx.log
                .info(&format!("ok: {} already present", framework_dir.display()));
            stats.already_ok += 1;
        } else {
            install_framework(ctx)?;
            stats.changed += 1;
        }

        let theme = framework_dir
            .join("themes")
            .join(format!("{}.zsh-theme", ctx.settings.shell.theme));
        stats += process_resources(ctx, [ManagedFileResource::new(&theme, THEME)], "write")?;
        if !ctx.dry_run {
            ctx.hand_over(&theme)?;
        }
        Ok(stats.finish(ctx))
    }
}

/// Download the bootstrap installer and run it unattended as the target
/// user.  The installer must neither start a shell nor change the login shell.
fn install_framework(ctx: &Context) -> Result<()> {
    let url = &ctx.settings.shell.framework_installer_url;
    let installer = ctx.work_root.join(INSTALLER_NAME);
    let script = installer.display().to_string();
    let cmd = CommandSpec::new("sh", &[script.as_str(), "--unattended"])
        .with_env("RUNZSH", "no")
        .with_env("CHSH", "no");

    if ctx.dry_run {
        ctx.log.dry_run(&format!("would download {url}"));
        return ctx.run_user_command(&cmd);
    }

    ctx.prepare_work_root()?;
    // A leftover (or planted) entry must not be written through.
    remove_path(&installer)?;
    ctx.log.info(&format!("downloading {url}"));
    ctx.fetcher
        .fetch(url, &installer)
        .context("downloading the oh-my-zsh installer")?;
    let result = ctx.run_user_command(&cmd);
    if let Err(e) = remove_path(&installer) {
        ctx.log.warn(&format!("cleanup failed: {e:#}"));
    }
    result
}

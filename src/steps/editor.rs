//! Build and install Neovim from a source tarball.
use anyhow::{Context as _, Result, bail};
use std::path::{Path, PathBuf};

use super::{Context, Step, StepResult};
use crate::exec::{CommandSpec, InterruptShield, Interrupts};
use crate::fetch::verify_sha256;
use crate::logging::Log;
use crate::resources::helpers::fs::{create_private_dir, remove_path};

/// Name of the build directory under the work root.
const WORK_DIR_NAME: &str = "provision-neovim";

/// Build the pinned Neovim release from its source archive and install it.
#[derive(Debug)]
pub struct BuildEditor;

impl Step for BuildEditor {
    fn name(&self) -> &'static str {
        "Build Neovim from source"
    }

    fn question(&self, ctx: &Context) -> String {
        format!(
            "Build and install Neovim {} from source?",
            ctx.settings.editor.version
        )
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let url = ctx.settings.editor.archive_url();
        if ctx.dry_run {
            ctx.log.dry_run(&format!("would download {url}"));
        }

        // Removed on every exit path below, including errors and Ctrl-C.
        let work = if ctx.dry_run {
            None
        } else {
            Some(WorkDir::prepare(ctx)?)
        };
        let root = work
            .as_ref()
            .map_or_else(|| ctx.work_root.join(WORK_DIR_NAME), |w| w.path.clone());
        let archive = root.join("neovim.tar.gz");
        let src = root.join("src");

        if let Some(work) = &work {
            ctx.log.info(&format!("downloading {url}"));
            ctx.fetcher
                .fetch(&url, &archive)
                .with_context(|| format!("downloading Neovim {}", ctx.settings.editor.version))?;
            if let Some(expected) = &ctx.settings.editor.sha256 {
                verify_sha256(&archive, expected)?;
                ctx.log.debug("archive checksum verified");
            }
            std::fs::create_dir_all(&src)
                .with_context(|| format!("creating {}", src.display()))?;
            work.check_interrupt()?;
        }

        let [extract, compile, install] = build_commands(&archive, &src);
        for cmd in [extract, compile, ctx.privileged(install)] {
            ctx.run_command(&cmd)?;
            if let Some(work) = &work {
                work.check_interrupt()?;
            }
        }

        Ok(ctx.finished())
    }
}

/// Extract, compile in Release mode, install.  The caller wraps the install
/// command in the privilege wrapper.
fn build_commands(archive: &Path, src: &Path) -> [CommandSpec; 3] {
    let archive = archive.display().to_string();
    let src_arg = src.display().to_string();
    [
        CommandSpec::new(
            "tar",
            &[
                "-xzf",
                archive.as_str(),
                "-C",
                src_arg.as_str(),
                "--strip-components=1",
            ],
        ),
        CommandSpec::new("make", &["CMAKE_BUILD_TYPE=Release"]).in_dir(src),
        CommandSpec::new("make", &["install"]).in_dir(src),
    ]
}

/// Scratch directory for the archive and the extracted source tree.
///
/// Holds an [`InterruptShield`] so a Ctrl-C while it exists lets the step
/// unwind and remove it.
struct WorkDir<'a> {
    path: PathBuf,
    log: &'a dyn Log,
    interrupts: &'a Interrupts,
    _shield: InterruptShield,
}

impl<'a> WorkDir<'a> {
    /// Create a fresh, owner-only work directory under the private work
    /// root, removing leftovers of an earlier run first.
    fn prepare(ctx: &'a Context) -> Result<Self> {
        let shield = ctx.interrupts.shield();
        ctx.prepare_work_root()?;
        let path = ctx.work_root.join(WORK_DIR_NAME);
        if path.symlink_metadata().is_ok() {
            ctx.log.debug(&format!("removing stale {}", path.display()));
            remove_path(&path)?;
        }
        create_private_dir(&path)?;
        Ok(Self {
            path,
            log: &*ctx.log,
            interrupts: &ctx.interrupts,
            _shield: shield,
        })
    }

    fn check_interrupt(&self) -> Result<()> {
        if self.interrupts.interrupted() {
            bail!("interrupted while building in {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for WorkDir<'_> {
    fn drop(&mut self) {
        match remove_path(&self.path) {
            Ok(()) => self
                .log
                .debug(&format!("removed build tree {}", self.path.display())),
            Err(e) => self.log.warn(&format!("cleanup failed: {e:#}")),
        }
    }
}

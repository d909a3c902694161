//! Shared run state handed to every step.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

use super::StepResult;
use crate::config::Settings;
use crate::exec::{AsUserExecutor, CommandSpec, Executor, Interrupts};
use crate::fetch::Fetcher;
use crate::logging::Log;
use crate::platform::PlatformProfile;
use crate::privilege::PrivilegeMode;
use crate::prompt::Prompter;
use crate::resources::helpers::fs::ensure_private_dir;

/// Shared context for step execution.
///
/// Built once after privilege and platform resolution; steps only read it,
/// apart from the package index flag.
pub struct Context {
    /// Package-manager profile of the selected distribution.
    pub profile: &'static PlatformProfile,
    /// Resolved privilege mode.
    pub privilege: PrivilegeMode,
    /// Provisioning settings.
    pub settings: Arc<Settings>,
    /// Logger for output and step recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// User's home directory path.
    pub home: PathBuf,
    /// Account whose login shell and files are configured.
    pub user: String,
    /// Directory for temporary downloads and build trees.
    pub work_root: PathBuf,
    /// Account that receives created files when running for another user.
    pub owner: Option<Owner>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Executor for user-level commands; runs them as [`Context::user`]
    /// when [`Context::owner`] is set.
    pub user_executor: Arc<dyn Executor>,
    /// Network fetcher.
    pub fetcher: Arc<dyn Fetcher>,
    /// Source of confirmations.
    pub prompter: Arc<dyn Prompter>,
    /// Ctrl-C state shared with the executor.
    pub interrupts: Interrupts,
    /// Set once the package index has been refreshed in this run.
    index_refreshed: AtomicBool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("profile", &self.profile.id)
            .field("privilege", &self.privilege)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("user", &self.user)
            .field("work_root", &self.work_root)
            .field("owner", &self.owner)
            .field("executor", &"<dyn Executor>")
            .field("fetcher", &"<dyn Fetcher>")
            .field("prompter", &"<dyn Prompter>")
            .finish_non_exhaustive()
    }
}

/// Collaborators injected into a [`Context`].
#[derive(Clone)]
pub struct Services {
    /// Logger.
    pub log: Arc<dyn Log>,
    /// Command executor.
    pub executor: Arc<dyn Executor>,
    /// Network fetcher.
    pub fetcher: Arc<dyn Fetcher>,
    /// Confirmation source.
    pub prompter: Arc<dyn Prompter>,
    /// Ctrl-C state.
    pub interrupts: Interrupts,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// Numeric identity of the account a root process provisions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    /// User id.
    pub uid: u32,
    /// Primary group id.
    pub gid: u32,
}

/// A passwd entry: home directory and numeric identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Home directory.
    pub home: PathBuf,
    /// Numeric identity.
    pub owner: Owner,
}

/// Host facts a run depends on.
#[derive(Debug, Clone)]
pub struct HostInfo {
    /// User's home directory.
    pub home: PathBuf,
    /// Account whose login shell and files are configured.
    pub user: String,
    /// Directory for temporary downloads and build trees.
    pub work_root: PathBuf,
    /// Set when a root process provisions for the account that ran `sudo`.
    pub owner: Option<Owner>,
}

impl HostInfo {
    /// Read host facts from the environment and the passwd database.
    ///
    /// # Errors
    ///
    /// See [`HostInfo::resolve`].
    pub fn from_env() -> Result<Self> {
        Self::resolve(
            |key| std::env::var(key).ok(),
            crate::privilege::effective_user_is_root(),
            lookup_account,
        )
    }

    /// Work out whom to provision for.
    ///
    /// A root process started through `sudo` targets `$SUDO_USER`, whose home
    /// comes from `lookup` since `sudo` usually resets `$HOME` to root's.
    /// Anything else targets `$USER` in `$HOME`.  The work root lives in the
    /// target's cache directory, never in the shared temp directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the target account cannot be looked up, or if
    /// `HOME` or `USER` is unset outside `sudo`.
    pub fn resolve(
        var: impl Fn(&str) -> Option<String>,
        is_root: bool,
        lookup: impl Fn(&str) -> Result<Account>,
    ) -> Result<Self> {
        let sudo_user = var("SUDO_USER").filter(|u| !u.is_empty() && u != "root");
        if is_root && let Some(user) = sudo_user {
            let account =
                lookup(&user).with_context(|| format!("looking up account {user}"))?;
            let work_root = account.home.join(".cache").join("provision").join("work");
            return Ok(Self {
                home: account.home,
                user,
                work_root,
                owner: Some(account.owner),
            });
        }

        let home = var("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("HOME environment variable is not set"))?;
        let user = var("USER")
            .ok_or_else(|| anyhow::anyhow!("USER environment variable is not set"))?;
        let cache = var("XDG_CACHE_HOME")
            .filter(|v| !v.is_empty())
            .map_or_else(|| home.join(".cache"), PathBuf::from);
        Ok(Self {
            work_root: cache.join("provision").join("work"),
            home,
            user,
            owner: None,
        })
    }
}

/// Look up `name` in the passwd database.
///
/// # Errors
///
/// Returns an error if the lookup fails or the account does not exist.
pub fn lookup_account(name: &str) -> Result<Account> {
    let user = nix::unistd::User::from_name(name)
        .with_context(|| format!("reading passwd entry for {name}"))?
        .ok_or_else(|| anyhow::anyhow!("no such user: {name}"))?;
    Ok(Account {
        home: user.dir,
        owner: Owner {
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
        },
    })
}

impl Context {
    /// Creates a new context for step execution.
    #[must_use]
    pub fn new(
        profile: &'static PlatformProfile,
        privilege: PrivilegeMode,
        settings: Arc<Settings>,
        host: HostInfo,
        services: Services,
        dry_run: bool,
    ) -> Self {
        let user_executor: Arc<dyn Executor> = if host.owner.is_some() {
            Arc::new(AsUserExecutor::new(
                Arc::clone(&services.executor),
                &host.user,
                &host.home,
            ))
        } else {
            Arc::clone(&services.executor)
        };
        Self {
            profile,
            privilege,
            settings,
            log: services.log,
            dry_run,
            home: host.home,
            user: host.user,
            work_root: host.work_root,
            owner: host.owner,
            executor: services.executor,
            user_executor,
            fetcher: services.fetcher,
            prompter: services.prompter,
            interrupts: services.interrupts,
            index_refreshed: AtomicBool::new(false),
        }
    }

    /// Prefix `cmd` with the privilege wrapper, if the mode has one.
    #[must_use]
    pub fn privileged(&self, cmd: CommandSpec) -> CommandSpec {
        cmd.wrapped(self.privilege.wrapper)
    }

    /// Create the work root with mode 0700 and hand it to the target user.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or restricted.
    pub fn prepare_work_root(&self) -> Result<()> {
        ensure_private_dir(&self.work_root)?;
        self.hand_over(&self.work_root)
    }

    /// Give `path` to the target user when running for another account.
    ///
    /// Every component between the home directory and `path` is handed
    /// over, so directories created on the way are not left owned by root.
    ///
    /// # Errors
    ///
    /// Returns an error if ownership cannot be changed.
    pub fn hand_over(&self, path: &Path) -> Result<()> {
        let Some(owner) = self.owner else {
            return Ok(());
        };
        let chown = |p: &Path| {
            std::os::unix::fs::lchown(p, Some(owner.uid), Some(owner.gid))
                .with_context(|| format!("changing owner of {}", p.display()))
        };
        let Ok(below_home) = path.strip_prefix(&self.home) else {
            return chown(path);
        };
        let mut current = self.home.clone();
        for component in below_home.components() {
            current.push(component);
            chown(&current)?;
        }
        Ok(())
    }

    /// Run `cmd` attached to the terminal, or only log it in dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn run_command(&self, cmd: &CommandSpec) -> Result<()> {
        if self.dry_run {
            self.log.dry_run(&format!("would run: {}", cmd.display()));
            return Ok(());
        }
        self.log.debug(&format!("running: {}", cmd.display()));
        self.executor.run_attached(cmd)
    }

    /// Like [`Context::run_command`], for user-level commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn run_user_command(&self, cmd: &CommandSpec) -> Result<()> {
        if self.dry_run {
            self.log.dry_run(&format!("would run: {}", cmd.display()));
            return Ok(());
        }
        self.log.debug(&format!("running: {}", cmd.display()));
        self.user_executor.run_attached(cmd)
    }

    /// Install `packages` with one privileged package-manager invocation.
    ///
    /// Managers that need an index refresh get it before the first install
    /// of the run only.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh or the install fails.
    pub fn install_packages<S: AsRef<str>>(&self, packages: &[S]) -> Result<StepResult> {
        if packages.is_empty() {
            return Ok(StepResult::Skipped("no packages configured".to_string()));
        }
        if let Some(update) = self.profile.update_args
            && !self.index_refreshed.swap(true, Ordering::SeqCst)
        {
            let cmd = CommandSpec::new(self.profile.executable, update);
            self.run_command(&self.privileged(cmd))?;
        }
        let args = self.profile.install_command(packages);
        let cmd = CommandSpec::new(self.profile.executable, args.as_slice());
        self.run_command(&self.privileged(cmd))?;
        Ok(self.finished())
    }

    /// `DryRun` in dry-run mode, `Ok` otherwise.
    #[must_use]
    pub const fn finished(&self) -> StepResult {
        if self.dry_run {
            StepResult::DryRun
        } else {
            StepResult::Ok
        }
    }
}

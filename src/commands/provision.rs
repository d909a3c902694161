//! The provisioning run: resolve privilege and platform, then drive the steps.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{Cli, VERSION};
use crate::config::Settings;
use crate::error::ProvisionError;
use crate::exec::{Interrupts, SystemExecutor};
use crate::fetch::HttpFetcher;
use crate::logging::Logger;
use crate::platform::Distro;
use crate::privilege::{self, PrivilegeMode};
use crate::prompt::StdioPrompter;
use crate::steps::{self, Context, HostInfo, Services, StepFilter};

/// Options that shape one provisioning run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Never wrap privileged commands.
    pub no_sudo: bool,
    /// Explicit distribution; `None` shows the menu.
    pub distro: Option<Distro>,
    /// Log actions instead of performing them.
    pub dry_run: bool,
    /// Step selection.
    pub filter: StepFilter,
}

impl From<&Cli> for RunOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            no_sudo: cli.no_sudo,
            distro: cli.distro,
            dry_run: cli.dry_run,
            filter: cli.step_filter(),
        }
    }
}

/// Run the provisioner against the real host.
///
/// # Errors
///
/// Returns an error if the environment or settings file cannot be read, or
/// the [`ProvisionError`] that ended the run.
pub fn run(cli: &Cli, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("provision {VERSION}"));
    let interrupts = Interrupts::default();
    interrupts.install_handler()?;

    let host = HostInfo::from_env()?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Settings::default_path(&host.home));
    let settings = Settings::load(&config_path, cli.config.is_some())?;

    let services = Services {
        log: log.clone(),
        executor: Arc::new(SystemExecutor::new(interrupts.clone())),
        fetcher: Arc::new(HttpFetcher::default()),
        prompter: Arc::new(StdioPrompter::stdio(cli.yes)),
        interrupts,
    };

    run_with(
        &RunOptions::from(cli),
        privilege::effective_user_is_root(),
        Distro::detect(),
        host,
        settings,
        services,
    )?;

    log.print_summary();
    Ok(())
}

/// Resolve privilege and platform, then offer every step in order.
///
/// Nothing is executed before both resolutions succeed.
///
/// # Errors
///
/// Returns [`ProvisionError::PrivilegeConflict`] or
/// [`ProvisionError::ElevationUnavailable`] before any prompt,
/// [`ProvisionError::InvalidSelection`] for a bad menu choice, or the error
/// of the first failing step.
pub fn run_with(
    opts: &RunOptions,
    is_root: bool,
    detected: Option<Distro>,
    host: HostInfo,
    settings: Settings,
    services: Services,
) -> Result<(), ProvisionError> {
    let log = services.log.clone();

    let privilege = PrivilegeMode::resolve(is_root, opts.no_sudo)?;
    if let Some(warning) = privilege.warning() {
        log.warn(warning);
    }
    if !opts.dry_run
        && let Some(wrapper) = privilege.wrapper
        && !services.executor.which(wrapper)
    {
        return Err(ProvisionError::ElevationUnavailable);
    }

    let distro = match opts.distro {
        Some(distro) => distro,
        None => services
            .prompter
            .choose_distro(detected)
            .map_err(|e| ProvisionError::from_step("Select distribution", e))?,
    };
    let profile = distro.profile();
    log.info(&format!(
        "platform: {} ({})",
        distro.label(),
        profile.package_manager
    ));
    if opts.dry_run {
        log.info("dry run: no changes will be made");
    }

    let rc_file = settings.shell.rc_file.clone();
    let ctx = Context::new(
        profile,
        privilege,
        Arc::new(settings),
        host,
        services,
        opts.dry_run,
    );
    steps::run_steps(&steps::all_steps(), &ctx, &opts.filter)?;

    log.stage("Done");
    log.info(&format!(
        "provisioning complete: reload your shell configuration with `source ~/{rc_file}`"
    ));
    Ok(())
}

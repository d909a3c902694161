//! Command-line arguments.
use std::path::PathBuf;

use clap::Parser;

use crate::platform::Distro;
use crate::steps::StepFilter;

/// Version string: `PROVISION_VERSION` from the build, else the crate version.
pub const VERSION: &str = match option_env!("PROVISION_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Top-level CLI entry point for the workstation provisioner.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "provision",
    about = "Interactively provision a Linux development workstation",
    version = VERSION
)]
pub struct Cli {
    /// Do not prefix privileged commands with sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Distribution to provision (ubuntu, fedora, arch or 1, 2, 3); skips the menu
    #[arg(long, value_name = "ID")]
    pub distro: Option<Distro>,

    /// Answer yes to every step confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Settings file (default: $XDG_CONFIG_HOME/provision/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip specific steps
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only specific steps
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}

impl Cli {
    /// The step filter built from `--skip` and `--only`.
    #[must_use]
    pub fn step_filter(&self) -> StepFilter {
        StepFilter {
            skip: self.skip.clone(),
            only: self.only.clone(),
        }
    }
}

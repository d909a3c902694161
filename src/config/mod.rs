//! Provisioning settings: compiled defaults with an optional TOML override.
//!
//! Every key is optional; a file only needs the values it changes:
//!
//! ```toml
//! [git]
//! name = "Ada Lovelace"
//! email = "ada@example.com"
//!
//! [editor]
//! version = "v0.10.2"
//!
//! [packages]
//! fedora = ["gcc", "make", "zsh"]
//! ```
pub mod packages;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;
use crate::platform::Distro;

/// All tunable values for a provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Global git identity.
    pub git: GitSettings,
    /// Editor release and configuration repository.
    pub editor: EditorSettings,
    /// Login shell, shell framework and PATH setup.
    pub shell: ShellSettings,
    /// Development package lists overriding the compiled defaults.
    pub packages: PackageSettings,
}

/// Global git identity written by the git step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitSettings {
    /// `user.name`.
    pub name: String,
    /// `user.email`.
    pub email: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            name: "Workstation Owner".to_string(),
            email: "owner@localhost".to_string(),
        }
    }
}

/// Pinned editor release and the configuration repository cloned after it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorSettings {
    /// Release tag to build (e.g. `v0.10.2`).
    pub version: String,
    /// Source archive URL; derived from `version` when unset.
    pub archive_url: Option<String>,
    /// Expected SHA-256 of the archive (lowercase hex); unchecked when unset.
    pub sha256: Option<String>,
    /// Git repository cloned into `~/.config/nvim`.
    pub config_repo: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: "v0.10.2".to_string(),
            archive_url: None,
            sha256: None,
            config_repo: "https://github.com/nvim-lua/kickstart.nvim.git".to_string(),
        }
    }
}

impl EditorSettings {
    /// The source archive URL for the pinned release.
    #[must_use]
    pub fn archive_url(&self) -> String {
        self.archive_url.clone().unwrap_or_else(|| {
            format!(
                "https://github.com/neovim/neovim/archive/refs/tags/{}.tar.gz",
                self.version
            )
        })
    }
}

/// Shell-related settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSettings {
    /// Login shell to switch to.
    pub name: String,
    /// Startup file (relative to `$HOME`) that receives the PATH line.
    pub rc_file: String,
    /// Personal scripts directory (relative to `$HOME`).
    pub scripts_dir: String,
    /// Shell framework bootstrap installer.
    pub framework_installer_url: String,
    /// Framework theme overwritten with the bundled prompt.
    pub theme: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            name: "zsh".to_string(),
            rc_file: ".zshrc".to_string(),
            scripts_dir: "scripts".to_string(),
            framework_installer_url:
                "https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh"
                    .to_string(),
            theme: "robbyrussell".to_string(),
        }
    }
}

/// Per-distribution development package overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSettings {
    /// Ubuntu override.
    pub ubuntu: Option<Vec<String>>,
    /// Fedora override.
    pub fedora: Option<Vec<String>>,
    /// Arch override.
    pub arch: Option<Vec<String>>,
}

impl Settings {
    /// Load settings from `path`.
    ///
    /// With `explicit = false` a missing file yields the defaults; with
    /// `explicit = true` (the operator passed `--config`) it is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an
    /// explicit file does not exist.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        if !path.exists() {
            if explicit {
                return Err(ProvisionError::Usage(format!(
                    "config file not found: {}",
                    path.display()
                ))
                .into());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML or unknown keys.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Default settings file: `$XDG_CONFIG_HOME/provision/config.toml`,
    /// falling back to `<home>/.config/provision/config.toml`.
    #[must_use]
    pub fn default_path(home: &Path) -> PathBuf {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map_or_else(|| home.join(".config"), PathBuf::from)
            .join("provision")
            .join("config.toml")
    }

    /// Development packages for `distro`, honouring overrides.
    #[must_use]
    pub fn packages_for(&self, distro: Distro) -> Vec<String> {
        let custom = match distro {
            Distro::Ubuntu => self.packages.ubuntu.as_ref(),
            Distro::Fedora => self.packages.fedora.as_ref(),
            Distro::Arch => self.packages.arch.as_ref(),
        };
        custom.cloned().unwrap_or_else(|| {
            packages::default_packages(distro)
                .iter()
                .map(|p| (*p).to_string())
                .collect()
        })
    }
}

//! Supported distributions and their package-manager command templates.
use std::fmt;
use std::str::FromStr;

use crate::error::ProvisionError;

/// A supported Linux distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distro {
    /// Ubuntu and other apt-based derivatives.
    Ubuntu,
    /// Fedora.
    Fedora,
    /// Arch Linux.
    Arch,
}

impl Distro {
    /// All supported distributions in menu order.
    pub const ALL: [Self; 3] = [Self::Ubuntu, Self::Fedora, Self::Arch];

    /// Human-readable name shown in the selection menu.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ubuntu => "Ubuntu",
            Self::Fedora => "Fedora",
            Self::Arch => "Arch",
        }
    }

    /// Map a menu choice (`"1"`, `"2"`, `"3"`) to a distribution.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidSelection`] for anything else.
    pub fn from_menu_choice(input: &str) -> Result<Self, ProvisionError> {
        match input.trim() {
            "1" => Ok(Self::Ubuntu),
            "2" => Ok(Self::Fedora),
            "3" => Ok(Self::Arch),
            other => Err(ProvisionError::InvalidSelection(other.to_string())),
        }
    }

    /// The platform profile for this distribution.
    #[must_use]
    pub fn profile(self) -> &'static PlatformProfile {
        match self {
            Self::Ubuntu => &UBUNTU,
            Self::Fedora => &FEDORA,
            Self::Arch => &ARCH,
        }
    }

    /// Detect the running distribution from the contents of `/etc/os-release`.
    ///
    /// Looks at `ID` first, then `ID_LIKE`.  Returns `None` when nothing
    /// matches; detection is only used as a hint in the selection menu.
    #[must_use]
    pub fn from_os_release(contents: &str) -> Option<Self> {
        let field = |key: &str| {
            contents.lines().find_map(|line| {
                let value = line.strip_prefix(key)?.strip_prefix('=')?;
                Some(value.trim().trim_matches('"').to_ascii_lowercase())
            })
        };
        let classify = |id: &str| {
            id.split_whitespace().find_map(|token| match token {
                "ubuntu" | "debian" => Some(Self::Ubuntu),
                "fedora" => Some(Self::Fedora),
                "arch" => Some(Self::Arch),
                _ => None,
            })
        };
        field("ID")
            .as_deref()
            .and_then(classify)
            .or_else(|| field("ID_LIKE").as_deref().and_then(classify))
    }

    /// Detect the running distribution from `/etc/os-release`.
    #[must_use]
    pub fn detect() -> Option<Self> {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .as_deref()
            .and_then(Self::from_os_release)
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ubuntu => write!(f, "ubuntu"),
            Self::Fedora => write!(f, "fedora"),
            Self::Arch => write!(f, "arch"),
        }
    }
}

impl FromStr for Distro {
    type Err = ProvisionError;

    /// Accepts the distribution id (`ubuntu`, `fedora`, `arch`) or its menu
    /// number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ubuntu" => Ok(Self::Ubuntu),
            "fedora" => Ok(Self::Fedora),
            "arch" => Ok(Self::Arch),
            other => Self::from_menu_choice(other),
        }
    }
}

/// Package manager family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// Debian/Ubuntu `apt-get`.
    Apt,
    /// Fedora `dnf`.
    Dnf,
    /// Arch `pacman`.
    Pacman,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apt => write!(f, "apt"),
            Self::Dnf => write!(f, "dnf"),
            Self::Pacman => write!(f, "pacman"),
        }
    }
}

/// Package-manager identity and command templates for one distribution.
///
/// Looked up once per run via [`Distro::profile`]; never mutated.
#[derive(Debug, PartialEq, Eq)]
pub struct PlatformProfile {
    /// Distribution this profile belongs to.
    pub id: Distro,
    /// Package manager family.
    pub package_manager: PackageManager,
    /// Executable invoked for updates and installs.
    pub executable: &'static str,
    /// Index refresh arguments, for managers that need one before installing.
    pub update_args: Option<&'static [&'static str]>,
    /// Install arguments; package names are appended.
    pub install_args: &'static [&'static str],
}

impl PlatformProfile {
    /// Arguments for installing `packages` in a single batch.
    #[must_use]
    pub fn install_command<S: AsRef<str>>(&self, packages: &[S]) -> Vec<String> {
        self.install_args
            .iter()
            .map(|a| (*a).to_string())
            .chain(packages.iter().map(|p| p.as_ref().to_string()))
            .collect()
    }
}

static UBUNTU: PlatformProfile = PlatformProfile {
    id: Distro::Ubuntu,
    package_manager: PackageManager::Apt,
    executable: "apt-get",
    update_args: Some(&["update"]),
    install_args: &["install", "-y"],
};

static FEDORA: PlatformProfile = PlatformProfile {
    id: Distro::Fedora,
    package_manager: PackageManager::Dnf,
    executable: "dnf",
    update_args: None,
    install_args: &["install", "-y"],
};

static ARCH: PlatformProfile = PlatformProfile {
    id: Distro::Arch,
    package_manager: PackageManager::Pacman,
    executable: "pacman",
    update_args: None,
    install_args: &["-S", "--needed", "--noconfirm"],
};

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_maps_distro_to_manager() {
        assert_eq!(
            Distro::Ubuntu.profile().package_manager,
            PackageManager::Apt
        );
        assert_eq!(Distro::Fedora.profile().package_manager, PackageManager::Dnf);
        assert_eq!(
            Distro::Arch.profile().package_manager,
            PackageManager::Pacman
        );
    }

    #[test]
    fn every_profile_refers_back_to_its_distro() {
        for distro in Distro::ALL {
            assert_eq!(distro.profile().id, distro);
        }
    }

    #[test]
    fn only_ubuntu_needs_an_update() {
        assert!(Distro::Ubuntu.profile().update_args.is_some());
        assert!(Distro::Fedora.profile().update_args.is_none());
        assert!(Distro::Arch.profile().update_args.is_none());
    }

    #[test]
    fn fedora_and_arch_install_non_interactively() {
        assert!(Distro::Fedora.profile().install_args.contains(&"-y"));
        assert!(Distro::Arch.profile().install_args.contains(&"--noconfirm"));
    }

    #[test]
    fn install_command_appends_packages() {
        let args = Distro::Fedora.profile().install_command(&["curl", "git"]);
        assert_eq!(args, vec!["install", "-y", "curl", "git"]);
    }

    #[test]
    fn menu_choices_map_to_distros() {
        assert_eq!(Distro::from_menu_choice("1").unwrap(), Distro::Ubuntu);
        assert_eq!(Distro::from_menu_choice(" 2\n").unwrap(), Distro::Fedora);
        assert_eq!(Distro::from_menu_choice("3").unwrap(), Distro::Arch);
    }

    #[test]
    fn invalid_menu_choices_are_rejected() {
        for input in ["4", "0", "x", "", "12", "ubuntu"] {
            assert!(
                matches!(
                    Distro::from_menu_choice(input),
                    Err(ProvisionError::InvalidSelection(_))
                ),
                "'{input}' should be rejected"
            );
        }
    }

    #[test]
    fn from_str_accepts_ids_and_numbers() {
        assert_eq!("Fedora".parse::<Distro>().unwrap(), Distro::Fedora);
        assert_eq!("3".parse::<Distro>().unwrap(), Distro::Arch);
        assert!("gentoo".parse::<Distro>().is_err());
    }

    #[test]
    fn os_release_id_is_detected() {
        let contents = "NAME=\"Fedora Linux\"\nID=fedora\nVERSION_ID=40\n";
        assert_eq!(Distro::from_os_release(contents), Some(Distro::Fedora));
    }

    #[test]
    fn os_release_id_like_is_used_as_fallback() {
        let contents = "ID=pop\nID_LIKE=\"ubuntu debian\"\n";
        assert_eq!(Distro::from_os_release(contents), Some(Distro::Ubuntu));
    }

    #[test]
    fn os_release_unknown_distro() {
        assert_eq!(Distro::from_os_release("ID=gentoo\n"), None);
        assert_eq!(Distro::from_os_release(""), None);
    }

    #[test]
    fn os_release_ignores_version_id() {
        // VERSION_ID must not be mistaken for ID.
        let contents = "VERSION_ID=\"22.04\"\nID=arch\n";
        assert_eq!(Distro::from_os_release(contents), Some(Distro::Arch));
    }

    #[test]
    fn display_uses_lowercase_ids() {
        assert_eq!(Distro::Ubuntu.to_string(), "ubuntu");
        assert_eq!(PackageManager::Pacman.to_string(), "pacman");
    }
}

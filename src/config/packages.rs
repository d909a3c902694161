//! Fixed package lists.
use crate::platform::Distro;

/// Baseline tools installed before anything else: network client and
/// version-control client.  Identical package names on every distribution.
pub const BASELINE_TOOLS: &[&str] = &["curl", "git"];

/// Development packages for Ubuntu, including the editor build prerequisites.
pub const UBUNTU_PACKAGES: &[&str] = &[
    "build-essential",
    "cmake",
    "ninja-build",
    "gettext",
    "unzip",
    "zsh",
    "tmux",
    "ripgrep",
    "fd-find",
    "fzf",
    "python3-pip",
    "nodejs",
    "npm",
];

/// Development packages for Fedora, including the editor build prerequisites.
pub const FEDORA_PACKAGES: &[&str] = &[
    "gcc",
    "gcc-c++",
    "make",
    "cmake",
    "ninja-build",
    "gettext",
    "unzip",
    "zsh",
    "tmux",
    "ripgrep",
    "fd-find",
    "fzf",
    "python3-pip",
    "nodejs",
    "npm",
];

/// Development packages for Arch, including the editor build prerequisites.
pub const ARCH_PACKAGES: &[&str] = &[
    "base-devel",
    "cmake",
    "ninja",
    "gettext",
    "unzip",
    "zsh",
    "tmux",
    "ripgrep",
    "fd",
    "fzf",
    "python-pip",
    "nodejs",
    "npm",
];

/// The compiled-in development package list for `distro`.
#[must_use]
pub const fn default_packages(distro: Distro) -> &'static [&'static str] {
    match distro {
        Distro::Ubuntu => UBUNTU_PACKAGES,
        Distro::Fedora => FEDORA_PACKAGES,
        Distro::Arch => ARCH_PACKAGES,
    }
}

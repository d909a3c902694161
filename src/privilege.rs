//! Privilege mode resolution.
//!
//! Decided once at startup from the effective user id and `--no-sudo`, then
//! carried immutably in the step context.
use crate::error::ProvisionError;

/// Program used to elevate privileged commands for non-root users.
pub const ELEVATION_WRAPPER: &str = "sudo";

/// How privileged commands are run for the rest of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeMode {
    /// Whether the process itself runs as root.
    pub elevated: bool,
    /// Wrapper prefixed to privileged commands, if any.
    pub wrapper: Option<&'static str>,
}

impl PrivilegeMode {
    /// Resolve the privilege mode from the effective uid and `--no-sudo`.
    ///
    /// | root | `--no-sudo` | result                          |
    /// |------|-------------|---------------------------------|
    /// | yes  | no          | elevated, no wrapper            |
    /// | yes  | yes         | [`ProvisionError::PrivilegeConflict`] |
    /// | no   | no          | wrapped with `sudo`             |
    /// | no   | yes         | unprivileged, no wrapper        |
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::PrivilegeConflict`] when root and
    /// `--no-sudo` are combined.
    pub fn resolve(is_root: bool, no_sudo: bool) -> Result<Self, ProvisionError> {
        match (is_root, no_sudo) {
            (true, true) => Err(ProvisionError::PrivilegeConflict),
            (true, false) => Ok(Self {
                elevated: true,
                wrapper: None,
            }),
            (false, false) => Ok(Self {
                elevated: false,
                wrapper: Some(ELEVATION_WRAPPER),
            }),
            (false, true) => Ok(Self {
                elevated: false,
                wrapper: None,
            }),
        }
    }

    /// Whether privileged commands can be expected to succeed without
    /// further help (root, or wrapped with `sudo`).
    #[must_use]
    pub const fn can_elevate(&self) -> bool {
        self.elevated || self.wrapper.is_some()
    }

    /// Warning to show the operator for this mode, if any.
    #[must_use]
    pub const fn warning(&self) -> Option<&'static str> {
        match (self.elevated, self.wrapper) {
            (true, _) => None,
            (false, Some(_)) => Some(
                "not running as root: privileged commands will run through sudo and may ask for a password",
            ),
            (false, None) => Some(
                "running without privilege elevation (--no-sudo): package installs and other privileged steps may fail",
            ),
        }
    }
}

/// Whether the effective user id of this process is 0.
#[must_use]
pub fn effective_user_is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn root_without_flag_is_elevated_without_wrapper() {
        let mode = PrivilegeMode::resolve(true, false).unwrap();
        assert!(mode.elevated);
        assert_eq!(mode.wrapper, None);
        assert_eq!(mode.warning(), None);
    }

    #[test]
    fn root_with_no_sudo_is_a_conflict() {
        assert!(matches!(
            PrivilegeMode::resolve(true, true),
            Err(ProvisionError::PrivilegeConflict)
        ));
    }

    #[test]
    fn user_without_flag_is_wrapped_with_sudo() {
        let mode = PrivilegeMode::resolve(false, false).unwrap();
        assert!(!mode.elevated);
        assert_eq!(mode.wrapper, Some("sudo"));
        assert!(mode.can_elevate());
        assert!(mode.warning().unwrap().contains("sudo"));
    }

    #[test]
    fn user_with_no_sudo_runs_unwrapped_with_warning() {
        let mode = PrivilegeMode::resolve(false, true).unwrap();
        assert!(!mode.elevated);
        assert_eq!(mode.wrapper, None);
        assert!(!mode.can_elevate());
        assert!(mode.warning().unwrap().contains("--no-sudo"));
    }

    #[test]
    fn conflict_raised_exactly_when_root_and_flag() {
        for is_root in [false, true] {
            for no_sudo in [false, true] {
                let conflict = PrivilegeMode::resolve(is_root, no_sudo).is_err();
                assert_eq!(conflict, is_root && no_sudo, "root={is_root} no_sudo={no_sudo}");
            }
        }
    }
}

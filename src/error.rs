//! Domain-specific error types for the provisioner.
//!
//! Internal modules (steps, resources, fetchers) return [`anyhow::Error`]
//! with context attached.  The step runner and the command boundary convert
//! the outcomes into a [`ProvisionError`] so `main` can report one message and
//! exit non-zero.
//!
//! # Error kinds
//!
//! ```text
//! ProvisionError
//! ├── Usage               : bad or missing CLI argument
//! ├── PrivilegeConflict   : root combined with --no-sudo
//! ├── ElevationUnavailable: sudo required but not installed
//! ├── InvalidSelection    : distribution menu input out of range
//! ├── InvalidConfirmation : too many unreadable yes/no answers
//! ├── StepFailed          : an external command or file change failed
//! └── Interrupted         : operator pressed Ctrl-C
//! ```

use thiserror::Error;

/// Maximum number of attempts allowed for a yes/no confirmation.
pub const MAX_CONFIRM_ATTEMPTS: u32 = 3;

/// Top-level error type for a provisioning run.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A command-line argument was missing, unknown, or malformed.
    #[error("{0}")]
    Usage(String),

    /// The process is already root but `--no-sudo` was requested.
    #[error(
        "running as root but --no-sudo was given: drop --no-sudo or run as a regular user"
    )]
    PrivilegeConflict,

    /// Privileged commands need `sudo`, which is not on `PATH`.
    #[error("not running as root and sudo is not available: re-run as root or pass --no-sudo")]
    ElevationUnavailable,

    /// The distribution menu input was not one of the listed choices.
    #[error("invalid selection '{0}': expected 1 (Ubuntu), 2 (Fedora) or 3 (Arch)")]
    InvalidSelection(String),

    /// The yes/no prompt received too many unrecognised answers.
    #[error("no valid answer for '{question}' after {attempts} attempts")]
    InvalidConfirmation {
        /// Question that was asked.
        question: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// A step failed; the remaining steps were not run.
    #[error("step '{step}' failed: {cause:#}")]
    StepFailed {
        /// Name of the failing step.
        step: String,
        /// Underlying failure, with its context chain.
        cause: anyhow::Error,
    },

    /// The run was interrupted by the operator.
    #[error("interrupted")]
    Interrupted,
}

impl ProvisionError {
    /// Process exit code for this error.
    ///
    /// Every failure maps to `1`; `0` is reserved for success and `--help`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        1
    }

    /// Recover a typed error raised below an [`anyhow`] boundary, or wrap
    /// any other failure as a failure of `step`.
    #[must_use]
    pub fn from_step(step: &str, err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(e) => e,
            Err(cause) => Self::StepFailed {
                step: step.to_string(),
                cause,
            },
        }
    }
}

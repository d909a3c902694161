//! External command execution.
//!
//! Every package-manager, compiler, git and shell invocation goes through the
//! [`Executor`] trait so that steps can be exercised in tests with a
//! recording fake instead of touching the host.
use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output (empty for attached commands).
    pub stdout: String,
    /// Captured standard error (empty for attached commands).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// A successful result with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// A single external command: program, arguments, working directory and
/// extra environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory; inherits the current one when `None`.
    pub dir: Option<std::path::PathBuf>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Build a command from a program and its arguments.
    #[must_use]
    pub fn new<S: AsRef<str>>(program: &str, args: &[S]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            dir: None,
            env: Vec::new(),
        }
    }

    /// Run the command in `dir`.
    #[must_use]
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.dir = Some(dir.to_path_buf());
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Prefix the command with a privilege wrapper (e.g. `sudo`).
    ///
    /// Extra environment variables are passed through `env` so that the
    /// wrapper does not strip them.
    #[must_use]
    pub fn wrapped(self, wrapper: Option<&str>) -> Self {
        match wrapper {
            Some(wrapper) => self.prefixed(wrapper, &[]),
            None => self,
        }
    }

    /// Run the command as `user` through `sudo -u`, with `HOME` pointing at
    /// that user's home directory.
    #[must_use]
    pub fn as_user(self, user: &str, home: &Path) -> Self {
        let home = home.display().to_string();
        self.with_env("HOME", &home)
            .prefixed(crate::privilege::ELEVATION_WRAPPER, &["-u", user])
    }

    fn prefixed(self, wrapper: &str, wrapper_args: &[&str]) -> Self {
        let mut args = Vec::with_capacity(
            wrapper_args.len() + self.args.len() + self.env.len() + 2,
        );
        args.extend(wrapper_args.iter().map(|a| (*a).to_string()));
        if !self.env.is_empty() {
            args.push("env".to_string());
            args.extend(self.env.iter().map(|(k, v)| format!("{k}={v}")));
        }
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: wrapper.to_string(),
            args,
            dir: self.dir,
            env: Vec::new(),
        }
    }

    /// Render the command as a single shell-like line for logging.
    #[must_use]
    pub fn display(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.args.len() + 1);
        parts.push(&self.program);
        parts.extend(self.args.iter().map(String::as_str));
        let line = parts.join(" ");
        if self.env.is_empty() {
            line
        } else {
            let env: Vec<String> = self.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{} {line}", env.join(" "))
        }
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd
    }
}

/// Abstraction over external command execution.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command with captured output, failing on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with captured output, allowing failure.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command attached to the terminal so its own output (progress,
    /// errors, password prompts) reaches the operator.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run_attached(&self, cmd: &CommandSpec) -> Result<()>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone)]
pub struct SystemExecutor {
    interrupts: Interrupts,
}

impl SystemExecutor {
    /// An executor that shields attached children from the Ctrl-C handler
    /// watching `interrupts`.
    #[must_use]
    pub const fn new(interrupts: Interrupts) -> Self {
        Self { interrupts }
    }
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.run_unchecked(program, args)?;
        if !result.success {
            bail!(
                "{program} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_attached(&self, cmd: &CommandSpec) -> Result<()> {
        let label = cmd.display();
        let _shield = self.interrupts.shield();
        let status = cmd
            .to_command()
            .status()
            .with_context(|| format!("failed to execute: {label}"))?;
        if !status.success() {
            match status.code() {
                Some(code) => bail!("{label} failed (exit {code})"),
                None => bail!("{label} was terminated by a signal"),
            }
        }
        Ok(())
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// [`Executor`] that runs every command as another account.
///
/// Used when the provisioner was started through `sudo`: user-level work
/// (git, the shell framework installer) must act on the invoking user's home
/// and leave files owned by that user.
#[derive(Debug)]
pub struct AsUserExecutor {
    inner: Arc<dyn Executor>,
    user: String,
    home: std::path::PathBuf,
}

impl AsUserExecutor {
    /// Run commands of `inner` as `user` with `HOME` set to `home`.
    #[must_use]
    pub fn new(inner: Arc<dyn Executor>, user: &str, home: &Path) -> Self {
        Self {
            inner,
            user: user.to_string(),
            home: home.to_path_buf(),
        }
    }

    fn spec(&self, program: &str, args: &[&str]) -> CommandSpec {
        CommandSpec::new(program, args).as_user(&self.user, &self.home)
    }
}

impl Executor for AsUserExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let spec = self.spec(program, args);
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
        self.inner.run(&spec.program, &args)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let spec = self.spec(program, args);
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
        self.inner.run_unchecked(&spec.program, &args)
    }

    fn run_attached(&self, cmd: &CommandSpec) -> Result<()> {
        self.inner
            .run_attached(&cmd.clone().as_user(&self.user, &self.home))
    }

    fn which(&self, program: &str) -> bool {
        self.inner.which(program)
    }
}

/// Ctrl-C state of one run: the interrupt flag and the number of live
/// [`InterruptShield`]s.
///
/// Cloning shares the state.  Without a shield the handler exits
/// immediately: nothing needs cleaning up.  With one, the handler only
/// records the interrupt so the running child (which gets the signal too)
/// fails and cleanup runs on the way out.  A second Ctrl-C always exits.
#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    flag: Arc<AtomicBool>,
    shields: Arc<AtomicUsize>,
}

impl Interrupts {
    /// Start deferring Ctrl-C until the returned guard is dropped.
    #[must_use]
    pub fn shield(&self) -> InterruptShield {
        self.shields.fetch_add(1, Ordering::SeqCst);
        InterruptShield {
            shields: Arc::clone(&self.shields),
        }
    }

    /// Record a Ctrl-C.  Returns `true` when the process should exit now:
    /// no shield is alive, or this is the second Ctrl-C.
    #[must_use]
    pub fn on_signal(&self) -> bool {
        let repeated = self.flag.swap(true, Ordering::SeqCst);
        repeated || self.shields.load(Ordering::SeqCst) == 0
    }

    /// Whether Ctrl-C has been pressed during this run.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Install the process Ctrl-C handler feeding this state.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler is already installed.
    pub fn install_handler(&self) -> Result<()> {
        let state = self.clone();
        ctrlc::set_handler(move || {
            if state.on_signal() {
                std::process::exit(1);
            }
        })
        .context("installing Ctrl-C handler")
    }
}

/// Defers Ctrl-C while alive; see [`Interrupts`].
#[derive(Debug)]
pub struct InterruptShield {
    shields: Arc<AtomicUsize>,
}

impl Drop for InterruptShield {
    fn drop(&mut self) {
        self.shields.fetch_sub(1, Ordering::SeqCst);
    }
}

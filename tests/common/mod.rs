// Shared helpers for integration tests.
//
// Provides a recording executor, a fetcher that serves canned bytes, and a
// temporary host (home and work root) so each test can drive a full
// provisioning run without touching the real system.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use provision_cli::commands::provision::{RunOptions, run_with};
use provision_cli::config::Settings;
use provision_cli::error::ProvisionError;
use provision_cli::exec::{CommandSpec, ExecResult, Executor, Interrupts};
use provision_cli::fetch::Fetcher;
use provision_cli::logging::{Logger, StepEntry};
use provision_cli::platform::Distro;
use provision_cli::prompt::LinePrompter;
use provision_cli::steps::{HostInfo, Services};

/// Executor that records every command and succeeds unless the rendered
/// command line contains one of the configured failure patterns.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
    failing: Vec<String>,
}

impl RecordingExecutor {
    /// Fail every command whose rendered line contains `pattern`.
    pub fn failing_on(pattern: &str) -> Self {
        Self {
            failing: vec![pattern.to_string()],
            ..Self::default()
        }
    }

    /// Every command issued so far, rendered as `program arg..`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, line: String) -> bool {
        let ok = !self.failing.iter().any(|p| line.contains(p.as_str()));
        self.calls.lock().expect("calls lock").push(line);
        ok
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let result = self.run_unchecked(program, args)?;
        if !result.success {
            anyhow::bail!("{program} failed");
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        let success = self.record(CommandSpec::new(program, args).display());
        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success,
            code: Some(i32::from(!success)),
        })
    }

    fn run_attached(&self, cmd: &CommandSpec) -> anyhow::Result<()> {
        if !self.record(cmd.display()) {
            anyhow::bail!("{} exited with status 1", cmd.display());
        }
        Ok(())
    }

    fn which(&self, _program: &str) -> bool {
        true
    }
}

/// Fetcher that writes fixed bytes to every destination.
#[derive(Debug, Default)]
pub struct CannedFetcher {
    urls: Mutex<Vec<String>>,
}

impl CannedFetcher {
    /// URLs requested so far.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("urls lock").clone()
    }
}

impl Fetcher for CannedFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        self.urls.lock().expect("urls lock").push(url.to_string());
        std::fs::write(dest, b"canned download")?;
        Ok(())
    }
}

/// An isolated host: temporary home and work root plus recording
/// collaborators.
pub struct TestHost {
    /// Temporary home directory.
    pub home: tempfile::TempDir,
    /// Temporary work root for downloads and build trees.
    pub work: tempfile::TempDir,
    /// Executor shared with every run.
    pub executor: Arc<RecordingExecutor>,
    /// Fetcher shared with every run.
    pub fetcher: Arc<CannedFetcher>,
}

impl TestHost {
    /// A host whose commands all succeed.
    pub fn succeeding() -> Self {
        Self::with_executor(RecordingExecutor::default())
    }

    /// A host using `executor`.
    pub fn with_executor(executor: RecordingExecutor) -> Self {
        Self {
            home: tempfile::tempdir().expect("create home"),
            work: tempfile::tempdir().expect("create work root"),
            executor: Arc::new(executor),
            fetcher: Arc::new(CannedFetcher::default()),
        }
    }

    /// Home directory path.
    pub fn home_path(&self) -> PathBuf {
        self.home.path().to_path_buf()
    }

    /// Run the provisioner with `input` as the operator's typed answers.
    ///
    /// Returns the run result and the recorded step outcomes.
    pub fn run(
        &self,
        opts: &RunOptions,
        is_root: bool,
        input: &str,
    ) -> (Result<(), ProvisionError>, Vec<StepEntry>) {
        let log = Arc::new(Logger::new("provision-test"));
        let prompter = LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let services = Services {
            log: log.clone(),
            executor: self.executor.clone(),
            fetcher: self.fetcher.clone(),
            prompter: Arc::new(prompter),
            interrupts: Interrupts::default(),
        };
        let host = HostInfo {
            home: self.home_path(),
            user: "dev".to_string(),
            work_root: self.work.path().to_path_buf(),
            owner: None,
        };
        let result = run_with(
            opts,
            is_root,
            Some(Distro::Fedora),
            host,
            Settings::default(),
            services,
        );
        (result, log.step_entries())
    }
}

/// Options restricted to steps matching `only`.
pub fn only(names: &[&str]) -> RunOptions {
    let mut opts = RunOptions::default();
    opts.filter.only = names.iter().map(|n| (*n).to_string()).collect();
    opts
}

//! Core logging types: step entries, status, and the [`Log`] trait.

/// Step outcome for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEntry {
    /// Human-readable step name.
    pub name: String,
    /// Final status of the step.
    pub status: StepStatus,
    /// Optional detail message (e.g. why the step was not applicable).
    pub message: Option<String>,
}

/// Outcome of a step that did not abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step ran and completed.
    Ok,
    /// Operator answered "no", or the step was filtered out.
    Declined,
    /// Step was not offered because a dependency did not complete.
    NotApplicable,
    /// Step ran in dry-run mode; no changes were applied.
    DryRun,
}

/// Abstraction over logging backends.
///
/// Step and resource code logs through this trait so tests can substitute
/// their own sink.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a step outcome for the summary.
    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>);
}

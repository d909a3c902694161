//! Generic resource processing loop: check state, apply, collect stats.
use anyhow::Result;

use super::{Context, StepResult};
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Counters for steps that process one or more resources.
///
/// # Examples
///
/// ```
/// use provision_cli::steps::StepStats;
///
/// let stats = StepStats { changed: 1, already_ok: 2, skipped: 0 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok");
/// assert_eq!(stats.summary(true), "1 would change, 2 already ok");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    /// Number of resources changed or applied.
    pub changed: u32,
    /// Number of resources already in the desired state.
    pub already_ok: u32,
    /// Number of resources left alone because they are not ours to change.
    pub skipped: u32,
}

impl StepStats {
    /// Format the summary string (e.g. "1 changed, 1 already ok").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the matching [`StepResult`].
    ///
    /// A step whose resources were all correct, or all left alone, reports
    /// `Skipped` with the reason so the summary shows nothing happened.
    #[must_use]
    pub fn finish(self, ctx: &Context) -> StepResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if self.changed == 0 {
            let reason = if self.skipped > 0 {
                "left existing files alone"
            } else {
                "already configured"
            };
            return StepResult::Skipped(reason.to_string());
        }
        ctx.finished()
    }
}

impl std::ops::AddAssign for StepStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// Check and, where needed, apply each resource in order.
///
/// The first failing resource aborts the loop with its error.
///
/// # Errors
///
/// Returns the first error from a state check or an apply.
pub fn process_resources<R: Resource>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    verb: &str,
) -> Result<StepStats> {
    let mut stats = StepStats::default();
    for resource in resources {
        stats += process_single(ctx, &resource, verb)?;
    }
    Ok(stats)
}

fn process_single<R: Resource>(ctx: &Context, resource: &R, verb: &str) -> Result<StepStats> {
    let desc = resource.description();
    let mut delta = StepStats::default();
    match resource.current_state()? {
        ResourceState::Correct => {
            ctx.log.info(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Invalid { reason } => {
            ctx.log.warn(&format!("skipping {desc}: {reason}"));
            delta.skipped += 1;
        }
        state @ (ResourceState::Missing | ResourceState::Incorrect { .. }) => {
            if ctx.dry_run {
                let msg = if let ResourceState::Incorrect { current } = state {
                    format!("would {verb} {desc} (currently {current})")
                } else {
                    format!("would {verb}: {desc}")
                };
                ctx.log.dry_run(&msg);
                delta.changed += 1;
                return Ok(delta);
            }
            match resource.apply()? {
                ResourceChange::Applied => {
                    ctx.log.info(&format!("{verb}: {desc}"));
                    delta.changed += 1;
                }
                ResourceChange::AlreadyCorrect => delta.already_ok += 1,
            }
        }
    }
    Ok(delta)
}

//! The ordered, optional provisioning steps and the runner that drives them.
//!
//! Every step is offered in table order: stage banner, confirmation, action.
//! The first failing step aborts the run; later steps are never offered.
pub mod baseline;
mod context;
pub mod editor;
pub mod editor_config;
pub mod git_identity;
pub mod packages;
mod processing;
pub mod scripts;
pub mod shell;
pub mod shell_framework;

/// Implement [`Step::dependencies`] by expanding to the required
/// `fn dependencies(&self) -> &[TypeId]` method body.
///
/// The `const DEPS` intermediate gives the slice the `'static` lifetime the
/// return type requires.
///
/// ```ignore
/// step_deps![super::editor::BuildEditor]
/// ```
macro_rules! step_deps {
    [$($dep:ty),+ $(,)?] => {
        fn dependencies(&self) -> &[std::any::TypeId] {
            const DEPS: &[std::any::TypeId] = &[$(std::any::TypeId::of::<$dep>()),+];
            DEPS
        }
    };
}

pub(crate) use step_deps;

pub use context::{Account, Context, HostInfo, Owner, Services, lookup_account};
pub use processing::{StepStats, process_resources};

use std::any::TypeId;
use std::collections::HashSet;

use anyhow::Result;

use crate::error::ProvisionError;
use crate::logging::StepStatus;

/// Result of a single step execution.
///
/// # Examples
///
/// ```
/// use provision_cli::steps::StepResult;
///
/// let skipped = StepResult::Skipped("already configured".into());
/// assert!(matches!(skipped, StepResult::Skipped(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// Step completed and changed something.
    Ok,
    /// Step completed without needing to change anything.
    Skipped(String),
    /// Step ran in dry-run mode.
    DryRun,
}

/// A named, optional provisioning step.
///
/// The `'static` bound gives each step struct a stable [`TypeId`], which
/// dependency declarations refer to.
pub trait Step: Send + Sync + 'static {
    /// Human-readable step name, shown as the stage banner.
    fn name(&self) -> &'static str;

    /// The concrete `TypeId` of this step, used as a dependency identifier.
    fn step_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Steps that must have completed earlier in this run.
    ///
    /// A step whose dependency was declined, filtered out or itself not
    /// applicable is not offered.
    fn dependencies(&self) -> &[TypeId] {
        &[]
    }

    /// The yes/no question asked before running.
    fn question(&self, _ctx: &Context) -> String {
        format!("{}?", self.name())
    }

    /// Execute the step.
    ///
    /// # Errors
    ///
    /// Returns an error if a command fails, a download fails, or a file
    /// cannot be written.  The runner stops at the first error.
    fn run(&self, ctx: &Context) -> Result<StepResult>;
}

/// The complete, ordered step table.
#[must_use]
pub fn all_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(baseline::InstallBaselineTools),
        Box::new(packages::InstallDevPackages),
        Box::new(shell::SetDefaultShell),
        Box::new(scripts::AddScriptsToPath),
        Box::new(editor::BuildEditor),
        Box::new(editor_config::CloneEditorConfig),
        Box::new(git_identity::ConfigureGitIdentity),
        Box::new(shell_framework::InstallShellFramework),
    ]
}

/// Step selection from `--skip` / `--only`.
///
/// Matching is a case-insensitive substring test on the step name.
/// `--only` takes precedence over `--skip`.
#[derive(Debug, Clone, Default)]
pub struct StepFilter {
    /// Steps to leave out.
    pub skip: Vec<String>,
    /// Steps to keep; everything else is left out.
    pub only: Vec<String>,
}

impl StepFilter {
    /// Whether the step named `name` may be offered.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        if !self.only.is_empty() {
            return self.only.iter().any(|o| name.contains(&o.to_lowercase()));
        }
        !self.skip.iter().any(|s| name.contains(&s.to_lowercase()))
    }
}

/// Offer every step in order, stopping at the first failure.
///
/// # Errors
///
/// Returns [`ProvisionError::StepFailed`] for the first failing step,
/// [`ProvisionError::Interrupted`] if Ctrl-C was pressed, or the
/// confirmation error if the operator never gave a usable answer.
pub fn run_steps(
    steps: &[Box<dyn Step>],
    ctx: &Context,
    filter: &StepFilter,
) -> Result<(), ProvisionError> {
    let mut completed: HashSet<TypeId> = HashSet::new();

    for step in steps {
        let name = step.name();
        if ctx.interrupts.interrupted() {
            return Err(ProvisionError::Interrupted);
        }

        if !filter.allows(name) {
            ctx.log.debug(&format!("skipping step: {name} (filtered)"));
            ctx.log.record_step(name, StepStatus::Declined, Some("filtered"));
            continue;
        }

        if let Some(dep) = step.dependencies().iter().find(|d| !completed.contains(d)) {
            let dep_name = steps
                .iter()
                .find(|s| s.step_id() == *dep)
                .map_or("a previous step", |s| s.name());
            let reason = format!("requires '{dep_name}'");
            ctx.log.info(&format!("{name}: not applicable ({reason})"));
            ctx.log
                .record_step(name, StepStatus::NotApplicable, Some(&reason));
            continue;
        }

        ctx.log.stage(name);
        let confirmed = ctx
            .prompter
            .confirm(&step.question(ctx))
            .map_err(|e| ProvisionError::from_step(name, e))?;
        if !confirmed {
            ctx.log.info("declined");
            ctx.log.record_step(name, StepStatus::Declined, None);
            continue;
        }

        match step.run(ctx) {
            Ok(StepResult::Ok) => {
                ctx.log.record_step(name, StepStatus::Ok, None);
            }
            Ok(StepResult::Skipped(reason)) => {
                ctx.log.info(&format!("nothing to do: {reason}"));
                ctx.log.record_step(name, StepStatus::Ok, Some(&reason));
            }
            Ok(StepResult::DryRun) => {
                ctx.log.record_step(name, StepStatus::DryRun, None);
            }
            Err(e) => {
                if ctx.interrupts.interrupted() {
                    ctx.log.debug(&format!("{name} interrupted: {e:#}"));
                    return Err(ProvisionError::Interrupted);
                }
                return Err(ProvisionError::from_step(name, e));
            }
        }
        completed.insert(step.step_id());
    }
    Ok(())
}


#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::logging::StepEntry;
    use crate::platform::Distro;
    use crate::prompt::MockPrompter;
    use crate::resources::test_helpers::MockExecutor;
    use test_helpers::{FakeFetcher, step_env, yes_prompter};

    /// A mock step for testing the runner.
    struct MockStep<const N: usize> {
        result: Result<StepResult, &'static str>,
    }

    impl<const N: usize> Step for MockStep<N> {
        fn name(&self) -> &'static str {
            match N {
                0 => "first",
                1 => "second",
                _ => "third",
            }
        }

        fn run(&self, _ctx: &Context) -> Result<StepResult> {
            self.result.clone().map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    /// Depends on `MockStep<0>`.
    struct DependentStep;

    impl Step for DependentStep {
        fn name(&self) -> &'static str {
            "dependent"
        }

        step_deps![MockStep<0>];

        fn run(&self, _ctx: &Context) -> Result<StepResult> {
            Ok(StepResult::Ok)
        }
    }

    /// Fails the way an attached child does when Ctrl-C reaches it.
    struct CtrlCStep;

    impl Step for CtrlCStep {
        fn name(&self) -> &'static str {
            "interrupted"
        }

        fn run(&self, ctx: &Context) -> Result<StepResult> {
            let _child = ctx.interrupts.shield();
            let exit_now = ctx.interrupts.on_signal();
            anyhow::ensure!(!exit_now, "a shielded Ctrl-C must not exit");
            anyhow::bail!("make: terminated by signal")
        }
    }

    fn env_with(prompter: MockPrompter) -> test_helpers::StepTestEnv {
        step_env(
            Distro::Fedora,
            MockExecutor::with_responses(vec![]),
            FakeFetcher::default(),
            prompter,
            false,
        )
    }

    fn statuses(entries: &[StepEntry]) -> Vec<(&str, StepStatus)> {
        entries
            .iter()
            .map(|e| (e.name.as_str(), e.status))
            .collect()
    }

    #[test]
    fn step_names_are_unique() {
        let steps = all_steps();
        let names: HashSet<_> = steps.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), steps.len());
    }

    #[test]
    fn dependencies_point_backwards() {
        let steps = all_steps();
        for (i, step) in steps.iter().enumerate() {
            for dep in step.dependencies() {
                let pos = steps
                    .iter()
                    .position(|s| s.step_id() == *dep)
                    .expect("dependency must be in the table");
                assert!(pos < i, "{} depends on a later step", step.name());
            }
        }
    }

    #[test]
    fn filter_only_wins_over_skip() {
        let filter = StepFilter {
            skip: vec!["baseline".to_string()],
            only: vec!["BASELINE".to_string()],
        };
        assert!(filter.allows("Install baseline tools"));
        assert!(!filter.allows("Configure git identity"));
    }

    #[test]
    fn filter_skip_matches_substring() {
        let filter = StepFilter {
            skip: vec!["git".to_string()],
            only: vec![],
        };
        assert!(!filter.allows("Configure git identity"));
        assert!(filter.allows("Set default shell"));
    }

    #[test]
    fn runner_stops_at_first_failure() {
        let env = env_with(yes_prompter());
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(MockStep::<0> {
                result: Ok(StepResult::Ok),
            }),
            Box::new(MockStep::<1> {
                result: Err("kaboom"),
            }),
            Box::new(MockStep::<2> {
                result: Ok(StepResult::Ok),
            }),
        ];
        let err = run_steps(&steps, &env.ctx, &StepFilter::default()).unwrap_err();
        match err {
            ProvisionError::StepFailed { step, cause } => {
                assert_eq!(step, "second");
                assert_eq!(cause.to_string(), "kaboom");
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
        assert_eq!(
            statuses(&env.log.step_entries()),
            vec![("first", StepStatus::Ok)],
            "the third step must never be offered"
        );
    }

    #[test]
    fn ctrl_c_reports_interrupted_and_offers_nothing_after() {
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| Ok(true));
        let env = env_with(prompter);
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(CtrlCStep),
            Box::new(MockStep::<1> {
                result: Ok(StepResult::Ok),
            }),
        ];
        let err = run_steps(&steps, &env.ctx, &StepFilter::default()).unwrap_err();
        assert!(matches!(err, ProvisionError::Interrupted), "{err:?}");
        assert!(env.log.step_entries().is_empty());
    }

    #[test]
    fn pending_interrupt_stops_before_the_next_step() {
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().never();
        let env = env_with(prompter);
        let _shield = env.ctx.interrupts.shield();
        assert!(!env.ctx.interrupts.on_signal());
        let steps: Vec<Box<dyn Step>> = vec![Box::new(MockStep::<0> {
            result: Ok(StepResult::Ok),
        })];
        let err = run_steps(&steps, &env.ctx, &StepFilter::default()).unwrap_err();
        assert!(matches!(err, ProvisionError::Interrupted));
    }

    #[test]
    fn declined_step_does_not_stop_the_run() {
        let mut prompter = MockPrompter::new();
        prompter
            .expect_confirm()
            .withf(|q| q.starts_with("first"))
            .returning(|_| Ok(false));
        prompter
            .expect_confirm()
            .withf(|q| !q.starts_with("first"))
            .returning(|_| Ok(true));
        let env = env_with(prompter);
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(MockStep::<0> {
                result: Ok(StepResult::Ok),
            }),
            Box::new(MockStep::<1> {
                result: Ok(StepResult::DryRun),
            }),
        ];
        run_steps(&steps, &env.ctx, &StepFilter::default()).unwrap();
        assert_eq!(
            statuses(&env.log.step_entries()),
            vec![("first", StepStatus::Declined), ("second", StepStatus::DryRun)]
        );
    }

    #[test]
    fn dependent_step_not_offered_when_dependency_declined() {
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().times(1).returning(|_| Ok(false));
        let env = env_with(prompter);
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(MockStep::<0> {
                result: Ok(StepResult::Ok),
            }),
            Box::new(DependentStep),
        ];
        run_steps(&steps, &env.ctx, &StepFilter::default()).unwrap();
        let entries = env.log.step_entries();
        assert_eq!(entries[1].status, StepStatus::NotApplicable);
        assert_eq!(entries[1].message.as_deref(), Some("requires 'first'"));
    }

    #[test]
    fn dependent_step_offered_after_dependency_completed() {
        let env = env_with(yes_prompter());
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(MockStep::<0> {
                result: Ok(StepResult::Skipped("already configured".to_string())),
            }),
            Box::new(DependentStep),
        ];
        run_steps(&steps, &env.ctx, &StepFilter::default()).unwrap();
        assert_eq!(env.log.step_entries()[1].status, StepStatus::Ok);
    }

    #[test]
    fn filtered_step_is_recorded_without_prompting() {
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().never();
        let env = env_with(prompter);
        let steps: Vec<Box<dyn Step>> = vec![Box::new(MockStep::<0> {
            result: Ok(StepResult::Ok),
        })];
        let filter = StepFilter {
            skip: vec!["first".to_string()],
            only: vec![],
        };
        run_steps(&steps, &env.ctx, &filter).unwrap();
        assert_eq!(env.log.step_entries()[0].status, StepStatus::Declined);
    }

    #[test]
    fn confirmation_error_keeps_its_type() {
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().returning(|q| {
            Err(ProvisionError::InvalidConfirmation {
                question: q.to_string(),
                attempts: 3,
            }
            .into())
        });
        let env = env_with(prompter);
        let steps: Vec<Box<dyn Step>> = vec![Box::new(MockStep::<0> {
            result: Ok(StepResult::Ok),
        })];
        let err = run_steps(&steps, &env.ctx, &StepFilter::default()).unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidConfirmation { .. }));
    }
}

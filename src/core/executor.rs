//! The step driver — orchestration loop for an install run.
//!
//! Walks the recipe in order. Presence-checked steps record `satisfied`
//! and skip; convergent steps apply and record `converged` or `failed`.
//! Continuation after a failure is an explicit per-step policy, not an
//! accident of which function printed: only the privilege guard aborts.

use super::recipe::{self, RecipeStep};
use super::state;
use super::types::*;
use crate::journal::eventlog;
use crate::shell;
use crate::steps;
use crate::ui::{self, Styles};
use std::path::Path;
use std::time::Instant;

/// Configuration for an install run.
pub struct RunConfig<'a> {
    pub profile: &'a InstallProfile,
    pub state_dir: &'a Path,
    pub force: bool,
    pub step_filter: Option<&'a str>,
}

/// Outcome of a single step.
enum StepOutcome {
    /// Presence check passed — nothing applied.
    Satisfied,
    /// Step applied successfully.
    Converged,
    /// Filtered out.
    Skipped,
    /// Step failed; fatal means the run stops here.
    Failed { fatal: bool, error: String },
}

/// Shared context for recording step outcomes.
struct RecordCtx<'a> {
    ledger: &'a mut StepLedger,
    state_dir: &'a Path,
}

/// Execute the run.
///
/// The privilege guard is evaluated before the ledger or event log is
/// touched: a refused run leaves no trace on the host.
pub fn run(cfg: &RunConfig, styles: &Styles) -> Result<RunSummary, String> {
    let start = Instant::now();

    let gate = steps::check_script(StepKind::Privilege, cfg.profile)?;
    if !shell::check_passes(&gate)? {
        return Err(steps::privilege::denied_message());
    }

    let run_id = eventlog::new_run_id();
    let mut ledger = state::load_ledger(cfg.state_dir)?
        .unwrap_or_else(|| state::new_ledger(&cfg.profile.name));

    let _ = eventlog::append_event(
        cfg.state_dir,
        ProvisionEvent::RunStarted {
            run_id: run_id.clone(),
            generator: format!("cimentar {}", env!("CARGO_PKG_VERSION")),
        },
    );

    let mut converged = 0u32;
    let mut satisfied = 0u32;
    let mut failed = 0u32;
    let mut fatal_error: Option<String> = None;

    let mut ctx = RecordCtx {
        ledger: &mut ledger,
        state_dir: cfg.state_dir,
    };

    for step in recipe::steps() {
        match run_step(cfg, step, &mut ctx, styles)? {
            StepOutcome::Satisfied => satisfied += 1,
            StepOutcome::Converged => converged += 1,
            StepOutcome::Skipped => {}
            StepOutcome::Failed { fatal, error } => {
                failed += 1;
                if fatal {
                    fatal_error = Some(error);
                    break;
                }
            }
        }
    }

    ctx.ledger.generated_at = eventlog::now_iso8601();
    state::save_ledger(cfg.state_dir, ctx.ledger)?;

    let _ = eventlog::append_event(
        cfg.state_dir,
        ProvisionEvent::RunCompleted {
            run_id,
            steps_converged: converged,
            steps_satisfied: satisfied,
            steps_failed: failed,
            total_seconds: start.elapsed().as_secs_f64(),
        },
    );

    if let Some(error) = fatal_error {
        return Err(error);
    }

    Ok(RunSummary {
        steps_converged: converged,
        steps_satisfied: satisfied,
        steps_failed: failed,
        total_duration: start.elapsed(),
    })
}

fn run_step(
    cfg: &RunConfig,
    step: &RecipeStep,
    ctx: &mut RecordCtx,
    styles: &Styles,
) -> Result<StepOutcome, String> {
    if let Some(filter) = cfg.step_filter {
        // The guard always runs; everything else honors the filter.
        if step.id != filter && step.kind != StepKind::Privilege {
            return Ok(StepOutcome::Skipped);
        }
    }

    match step.converge {
        Converge::CheckOnly => {
            let script = steps::check_script(step.kind, cfg.profile)?;
            if shell::check_passes(&script)? {
                record_satisfied(ctx, step, cfg.profile);
                ui::note(styles, &format!("{} satisfied", step.id));
                Ok(StepOutcome::Satisfied)
            } else {
                let error = match step.kind {
                    StepKind::Privilege => steps::privilege::denied_message(),
                    _ => format!("guard '{}' failed", step.id),
                };
                record_failed(ctx, step, 0.0, &error);
                ui::fail(styles, &error);
                Ok(StepOutcome::Failed {
                    fatal: step.failure == FailureMode::Fatal,
                    error,
                })
            }
        }
        Converge::IfMissing => {
            if !cfg.force {
                let script = steps::check_script(step.kind, cfg.profile)?;
                if shell::check_passes(&script)? {
                    record_satisfied(ctx, step, cfg.profile);
                    ui::note(
                        styles,
                        &format!("{} already satisfied — skipping", step.id),
                    );
                    return Ok(StepOutcome::Satisfied);
                }
            }
            converge(cfg, step, ctx, styles)
        }
        Converge::Always => converge(cfg, step, ctx, styles),
    }
}

fn converge(
    cfg: &RunConfig,
    step: &RecipeStep,
    ctx: &mut RecordCtx,
    styles: &Styles,
) -> Result<StepOutcome, String> {
    ui::header(styles, &steps::describe(step.kind, cfg.profile));
    let _ = eventlog::append_event(
        ctx.state_dir,
        ProvisionEvent::StepStarted {
            step: step.id.to_string(),
        },
    );

    let step_start = Instant::now();
    match steps::apply(step.kind, cfg.profile) {
        Ok(detail) => {
            let duration = step_start.elapsed().as_secs_f64();
            record_converged(ctx, step, cfg.profile, duration, detail);
            ui::ok(styles, &format!("{} converged ({:.1}s)", step.id, duration));
            Ok(StepOutcome::Converged)
        }
        Err(error) => {
            let duration = step_start.elapsed().as_secs_f64();
            record_failed(ctx, step, duration, &error);
            ui::fail(styles, &format!("{} failed: {}", step.id, error));
            Ok(StepOutcome::Failed {
                fatal: step.failure == FailureMode::Fatal,
                error,
            })
        }
    }
}

/// Record a step whose presence check passed.
fn record_satisfied(ctx: &mut RecordCtx, step: &RecipeStep, profile: &InstallProfile) {
    ctx.ledger.steps.insert(
        step.id.to_string(),
        StepRecord {
            kind: step.kind,
            status: StepStatus::Satisfied,
            applied_at: Some(eventlog::now_iso8601()),
            duration_seconds: None,
            hash: steps::fingerprint(step.kind, profile),
            detail: None,
        },
    );
    let _ = eventlog::append_event(
        ctx.state_dir,
        ProvisionEvent::StepSatisfied {
            step: step.id.to_string(),
        },
    );
}

/// Record a successful apply.
fn record_converged(
    ctx: &mut RecordCtx,
    step: &RecipeStep,
    profile: &InstallProfile,
    duration: f64,
    detail: Option<String>,
) {
    let hash = steps::fingerprint(step.kind, profile);
    ctx.ledger.steps.insert(
        step.id.to_string(),
        StepRecord {
            kind: step.kind,
            status: StepStatus::Converged,
            applied_at: Some(eventlog::now_iso8601()),
            duration_seconds: Some(duration),
            hash: hash.clone(),
            detail,
        },
    );
    let _ = eventlog::append_event(
        ctx.state_dir,
        ProvisionEvent::StepConverged {
            step: step.id.to_string(),
            duration_seconds: duration,
            hash,
        },
    );
}

/// Record a failed apply or guard.
fn record_failed(ctx: &mut RecordCtx, step: &RecipeStep, duration: f64, error: &str) {
    ctx.ledger.steps.insert(
        step.id.to_string(),
        StepRecord {
            kind: step.kind,
            status: StepStatus::Failed,
            applied_at: Some(eventlog::now_iso8601()),
            duration_seconds: Some(duration),
            hash: String::new(),
            detail: Some(error.to_string()),
        },
    );
    let _ = eventlog::append_event(
        ctx.state_dir,
        ProvisionEvent::StepFailed {
            step: step.id.to_string(),
            error: error.to_string(),
        },
    );
}

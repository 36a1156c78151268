//! Plan generation — evaluate presence checks against the live host and
//! report what an install run would do.

use super::recipe;
use super::types::{Converge, InstallProfile, PlanAction, PlannedStep, ProvisionPlan};
use crate::shell;
use crate::steps;

/// Build the plan. Checks are read-only queries; nothing mutates.
pub fn plan(profile: &InstallProfile) -> Result<ProvisionPlan, String> {
    let mut planned = Vec::new();
    let mut to_install = 0u32;
    let mut to_sync = 0u32;
    let mut satisfied = 0u32;
    let mut blocked = 0u32;

    for step in recipe::steps() {
        let action = match step.converge {
            Converge::CheckOnly | Converge::IfMissing => {
                let script = steps::check_script(step.kind, profile)?;
                if shell::check_passes(&script)? {
                    PlanAction::Satisfied
                } else if step.converge == Converge::CheckOnly {
                    PlanAction::Blocked
                } else {
                    PlanAction::Install
                }
            }
            Converge::Always => PlanAction::Sync,
        };

        match action {
            PlanAction::Install => to_install += 1,
            PlanAction::Sync => to_sync += 1,
            PlanAction::Satisfied => satisfied += 1,
            PlanAction::Blocked => blocked += 1,
        }

        planned.push(PlannedStep {
            id: step.id.to_string(),
            kind: step.kind,
            action,
            description: steps::describe(step.kind, profile),
        });
    }

    Ok(ProvisionPlan {
        project: profile.name.clone(),
        steps: planned,
        to_install,
        to_sync,
        satisfied,
        blocked,
    })
}

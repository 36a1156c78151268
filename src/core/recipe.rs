//! The provisioning recipe — the fixed, ordered step list.
//!
//! There is exactly one recipe: leaves first, privilege gate in front.
//! Each entry carries its failure mode (does a failure stop the run?) and
//! its convergence policy (presence-checked install vs. unconditional
//! re-sync).

use super::types::{Converge, FailureMode, StepKind};

/// One entry in the recipe.
#[derive(Debug, Clone, Copy)]
pub struct RecipeStep {
    pub id: &'static str,
    pub kind: StepKind,
    pub failure: FailureMode,
    pub converge: Converge,
}

/// The full recipe in execution order.
pub fn steps() -> &'static [RecipeStep] {
    &[
        RecipeStep {
            id: "privilege",
            kind: StepKind::Privilege,
            failure: FailureMode::Fatal,
            converge: Converge::CheckOnly,
        },
        RecipeStep {
            id: "container-runtime",
            kind: StepKind::ContainerRuntime,
            failure: FailureMode::Continue,
            converge: Converge::IfMissing,
        },
        RecipeStep {
            id: "python-distribution",
            kind: StepKind::PythonDistribution,
            failure: FailureMode::Continue,
            converge: Converge::IfMissing,
        },
        RecipeStep {
            id: "project-archive",
            kind: StepKind::ProjectArchive,
            failure: FailureMode::Continue,
            converge: Converge::Always,
        },
        RecipeStep {
            id: "python-environment",
            kind: StepKind::PythonEnvironment,
            failure: FailureMode::Continue,
            converge: Converge::Always,
        },
        RecipeStep {
            id: "service-unit",
            kind: StepKind::ServiceUnit,
            failure: FailureMode::Continue,
            converge: Converge::Always,
        },
        RecipeStep {
            id: "control-scripts",
            kind: StepKind::ControlScripts,
            failure: FailureMode::Continue,
            converge: Converge::Always,
        },
        RecipeStep {
            id: "service-launch",
            kind: StepKind::ServiceLaunch,
            failure: FailureMode::Continue,
            converge: Converge::Always,
        },
    ]
}

/// Look up a recipe entry by id.
pub fn find(id: &str) -> Option<&'static RecipeStep> {
    steps().iter().find(|s| s.id == id)
}

//! Step handlers — dispatch on `StepKind`.
//!
//! Each step produces:
//! - check: a presence-check script (exit 0 = desired state already holds)
//! - apply: converge the host (generated shell where the host's own tools
//!   do the work, native Rust where downloads and archives need real
//!   error reporting)
//! - fingerprint: BLAKE3 hash of the desired state, for the ledger
//! - describe: one plan line

pub mod archive;
pub mod control;
pub mod environment;
pub mod launch;
pub mod privilege;
pub mod python;
pub mod runtime;
pub mod service;

use crate::core::types::{InstallProfile, StepKind};
use crate::journal::hasher;

/// Generate the presence-check script for a step.
pub fn check_script(kind: StepKind, profile: &InstallProfile) -> Result<String, String> {
    match kind {
        StepKind::Privilege => Ok(privilege::check_script()),
        StepKind::ContainerRuntime => Ok(runtime::check_script()),
        StepKind::PythonDistribution => Ok(python::check_script(profile)),
        other => Err(format!("{} re-syncs every run and has no presence check", other)),
    }
}

/// Converge a step. Returns an optional detail string (artifact hashes)
/// recorded in the ledger.
pub fn apply(kind: StepKind, profile: &InstallProfile) -> Result<Option<String>, String> {
    match kind {
        StepKind::Privilege => Err("privilege is a pure guard and cannot be applied".to_string()),
        StepKind::ContainerRuntime => runtime::apply(profile),
        StepKind::PythonDistribution => python::apply(profile),
        StepKind::ProjectArchive => archive::apply(profile),
        StepKind::PythonEnvironment => environment::apply(profile),
        StepKind::ServiceUnit => service::apply(profile),
        StepKind::ControlScripts => control::apply(profile),
        StepKind::ServiceLaunch => launch::apply(profile),
    }
}

/// BLAKE3 fingerprint of the step's desired state. Two runs with the same
/// profile produce the same fingerprint; any target change produces a new
/// one.
pub fn fingerprint(kind: StepKind, profile: &InstallProfile) -> String {
    let components: Vec<String> = match kind {
        StepKind::Privilege => vec!["uid=0".to_string()],
        StepKind::ContainerRuntime => vec![runtime::apply_script(profile)],
        StepKind::PythonDistribution => vec![
            profile.conda_installer_url.clone(),
            profile.conda_root.display().to_string(),
            profile.bin_dir.display().to_string(),
        ],
        StepKind::ProjectArchive => vec![
            profile.archive_url.clone(),
            profile.archive_sha256.clone().unwrap_or_default(),
            profile.install_dir.display().to_string(),
        ],
        StepKind::PythonEnvironment => vec![environment::apply_script(profile)],
        StepKind::ServiceUnit => vec![service::unit_text(profile)],
        StepKind::ControlScripts => {
            let mut parts = Vec::new();
            for (name, content) in control::scripts(profile) {
                parts.push(name);
                parts.push(content);
            }
            parts
        }
        StepKind::ServiceLaunch => vec![
            profile.service_name.clone(),
            profile.install_dir.display().to_string(),
            profile.start_wait_secs.to_string(),
        ],
    };
    let refs: Vec<&str> = components.iter().map(String::as_str).collect();
    hasher::fingerprint(&refs)
}

/// One-line description for plan output.
pub fn describe(kind: StepKind, profile: &InstallProfile) -> String {
    match kind {
        StepKind::Privilege => "require administrator privileges (uid 0)".to_string(),
        StepKind::ContainerRuntime => {
            "install Docker Engine + compose plugin via apt".to_string()
        }
        StepKind::PythonDistribution => {
            format!("install Miniconda into {}", profile.conda_root.display())
        }
        StepKind::ProjectArchive => format!(
            "fetch {} and sync into {}",
            profile.archive_url,
            profile.install_dir.display()
        ),
        StepKind::PythonEnvironment => format!(
            "create/update conda env '{}' (python {}) from {}",
            profile.env_name, profile.python_version, profile.manifest
        ),
        StepKind::ServiceUnit => format!(
            "register {}.service, enabled on boot",
            profile.service_name
        ),
        StepKind::ControlScripts => format!(
            "write {}-start/stop/status into {}",
            profile.control_prefix,
            profile.bin_dir.display()
        ),
        StepKind::ServiceLaunch => format!(
            "build image, start {}, probe liveness after {}s",
            profile.service_name, profile.start_wait_secs
        ),
    }
}

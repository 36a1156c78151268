//! Python environment step — named conda env, create-or-update.

use crate::core::types::InstallProfile;
use crate::shell;

/// One script for both branches: update the env's dependencies when it
/// exists, create it with the pinned interpreter when it doesn't, then
/// install the manifest either way.
pub fn apply_script(profile: &InstallProfile) -> String {
    let conda = profile.conda_bin().display().to_string();
    let env = &profile.env_name;
    let version = &profile.python_version;
    let manifest = profile.manifest_path().display().to_string();

    format!(
        "set -euo pipefail\n\
         CONDA='{conda}'\n\
         command -v \"$CONDA\" >/dev/null 2>&1 || CONDA=conda\n\
         test -f '{manifest}'\n\
         if \"$CONDA\" env list | awk '{{print $1}}' | grep -Fqx '{env}'; then\n\
           \"$CONDA\" env update -n '{env}' --file '{manifest}'\n\
         else\n\
           \"$CONDA\" create -n '{env}' 'python={version}' -y\n\
         fi\n\
         \"$CONDA\" run -n '{env}' pip install -r '{manifest}'"
    )
}

pub fn apply(profile: &InstallProfile) -> Result<Option<String>, String> {
    shell::converge(&apply_script(profile))?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_has_both_branches() {
        let script = apply_script(&InstallProfile::default());
        assert!(script.contains("env update -n 'code_execution_api'"));
        assert!(script.contains("create -n 'code_execution_api' 'python=3.11' -y"));
    }

    #[test]
    fn test_script_guards_on_env_list() {
        let script = apply_script(&InstallProfile::default());
        assert!(script.contains("env list"));
        assert!(script.contains("grep -Fqx 'code_execution_api'"));
    }

    #[test]
    fn test_script_installs_manifest() {
        let script = apply_script(&InstallProfile::default());
        assert!(script
            .contains("pip install -r '/opt/code-execution-api/requirements.txt'"));
    }

    #[test]
    fn test_script_requires_manifest_present() {
        // A missing manifest (stale or absent archive sync) must fail the
        // step, not silently no-op.
        let script = apply_script(&InstallProfile::default());
        assert!(script.contains("test -f '/opt/code-execution-api/requirements.txt'"));
    }

    #[test]
    fn test_script_interpolates_pin() {
        let mut profile = InstallProfile::default();
        profile.python_version = "3.12".to_string();
        assert!(apply_script(&profile).contains("python=3.12"));
    }
}

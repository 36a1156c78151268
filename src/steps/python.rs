//! Python distribution step — Miniconda into a fixed prefix.

use crate::core::types::InstallProfile;
use crate::fetch;
use crate::journal::hasher;
use crate::shell;
use std::path::Path;

/// Satisfied when the managed prefix has a conda binary, or one is on
/// PATH already.
pub fn check_script(profile: &InstallProfile) -> String {
    format!(
        "test -x '{}' || command -v conda >/dev/null 2>&1",
        profile.conda_bin().display()
    )
}

/// Batch-mode install of a downloaded installer, plus the PATH symlink.
pub fn install_script(profile: &InstallProfile, installer: &Path) -> String {
    let conda = profile.conda_bin();
    let link = profile.bin_dir.join("conda");
    format!(
        "set -euo pipefail\n\
         bash '{installer}' -b -p '{prefix}'\n\
         mkdir -p '{bin_dir}'\n\
         ln -sfn '{conda}' '{link}'\n\
         '{conda}' --version >/dev/null",
        installer = installer.display(),
        prefix = profile.conda_root.display(),
        bin_dir = profile.bin_dir.display(),
        conda = conda.display(),
        link = link.display(),
    )
}

/// Download the installer into a scratch dir, run it, link conda onto the
/// system path. The scratch dir is removed when this returns — on failure
/// paths too.
pub fn apply(profile: &InstallProfile) -> Result<Option<String>, String> {
    let scratch = tempfile::tempdir().map_err(|e| format!("cannot create scratch dir: {}", e))?;
    let installer = scratch.path().join("miniconda-installer.sh");

    fetch::download(
        &profile.conda_installer_url,
        &installer,
        profile.conda_installer_sha256.as_deref(),
    )?;
    let artifact = hasher::artifact_fingerprint(&installer)?;

    shell::converge(&install_script(profile, &installer))?;
    Ok(Some(format!("installer {}", artifact)))
}

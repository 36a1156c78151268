//! Launch step — build the image, start the unit, pause, probe liveness.

use crate::core::types::InstallProfile;
use crate::shell;
use std::time::Duration;

pub fn build_script(profile: &InstallProfile) -> String {
    format!(
        "set -euo pipefail\n\
         cd '{}'\n\
         docker compose build",
        profile.install_dir.display()
    )
}

pub fn start_script(profile: &InstallProfile) -> String {
    format!("systemctl start '{}'", profile.service_name)
}

pub fn stop_script(profile: &InstallProfile) -> String {
    format!("systemctl stop '{}'", profile.service_name)
}

pub fn probe_script(profile: &InstallProfile) -> String {
    format!("systemctl is-active --quiet '{}'", profile.service_name)
}

/// What to look at when the probe fails. A hint, not a remediation.
pub fn diagnostic_hint(profile: &InstallProfile) -> String {
    format!(
        "inspect `systemctl status {service}`, `journalctl -u {service}`, or `docker compose logs` in {dir}",
        service = profile.service_name,
        dir = profile.install_dir.display(),
    )
}

/// Build, start, wait the fixed delay, then query the service manager.
/// An inactive service is this step's failure; the run still finishes.
pub fn apply(profile: &InstallProfile) -> Result<Option<String>, String> {
    shell::converge(&build_script(profile))
        .map_err(|e| format!("image build failed: {}", e))?;
    shell::converge(&start_script(profile))
        .map_err(|e| format!("service start failed: {}", e))?;

    std::thread::sleep(Duration::from_secs(profile.start_wait_secs));

    if shell::check_passes(&probe_script(profile))? {
        Ok(Some("active".to_string()))
    } else {
        Err(format!(
            "{} did not reach active state within {}s — {}",
            profile.service_name,
            profile.start_wait_secs,
            diagnostic_hint(profile)
        ))
    }
}

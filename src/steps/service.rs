//! Service unit step — render the systemd unit, install it, enable on
//! boot. Any prior unit of the same name is overwritten.

use crate::core::types::InstallProfile;
use crate::shell;
use std::path::PathBuf;

/// The unit text, interpolating the install dir and the fixed
/// compose-driven start/stop commands.
pub fn unit_text(profile: &InstallProfile) -> String {
    format!(
        "[Unit]\n\
         Description={display} service\n\
         After=network-online.target docker.service\n\
         Requires=docker.service\n\
         \n\
         [Service]\n\
         WorkingDirectory={workdir}\n\
         ExecStart=/usr/bin/docker compose up\n\
         ExecStop=/usr/bin/docker compose down\n\
         Restart=always\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        display = profile.display_name,
        workdir = profile.install_dir.display(),
    )
}

/// Write the unit file, creating the unit dir if needed.
pub fn write_unit(profile: &InstallProfile) -> Result<PathBuf, String> {
    let path = profile.unit_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
    }
    std::fs::write(&path, unit_text(profile))
        .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    Ok(path)
}

/// Reload the manager's view of units and enable boot-time start.
pub fn enable_script(profile: &InstallProfile) -> String {
    format!(
        "set -euo pipefail\n\
         systemctl daemon-reload\n\
         systemctl enable '{}'",
        profile.service_name
    )
}

pub fn apply(profile: &InstallProfile) -> Result<Option<String>, String> {
    write_unit(profile)?;
    shell::converge(&enable_script(profile))?;
    Ok(None)
}

//! Container runtime step — Docker Engine + compose plugin via apt.

use crate::core::types::InstallProfile;
use crate::shell;

/// Satisfied when both the engine and the compose plugin respond.
pub fn check_script() -> String {
    "command -v docker >/dev/null 2>&1 && docker compose version >/dev/null 2>&1".to_string()
}

/// Full install: package index refresh, keyring, apt source, engine +
/// plugins, unit enablement. The signing key is fetched without
/// fingerprint verification — the upstream publishes no pin for it.
pub fn apply_script(profile: &InstallProfile) -> String {
    let key_url = &profile.docker_key_url;
    let repo_url = &profile.docker_repo_url;
    let keyring = profile.keyring_path.display();
    let apt_source = profile.apt_source_path.display();
    let keyring_dir = profile
        .keyring_path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/etc/apt/keyrings".to_string());

    format!(
        "set -euo pipefail\n\
         export DEBIAN_FRONTEND=noninteractive\n\
         apt-get update -qq\n\
         apt-get install -y -qq ca-certificates curl gnupg\n\
         install -m 0755 -d '{keyring_dir}'\n\
         curl -fsSL '{key_url}' | gpg --dearmor --yes -o '{keyring}'\n\
         chmod a+r '{keyring}'\n\
         echo \"deb [arch=$(dpkg --print-architecture) signed-by={keyring}] {repo_url} \
         $(. /etc/os-release && echo \"$VERSION_CODENAME\") stable\" > '{apt_source}'\n\
         apt-get update -qq\n\
         apt-get install -y -qq docker-ce docker-ce-cli containerd.io \
         docker-buildx-plugin docker-compose-plugin\n\
         systemctl enable --now docker\n\
         # Postcondition: engine and plugin respond\n\
         docker --version >/dev/null\n\
         docker compose version >/dev/null"
    )
}

pub fn apply(profile: &InstallProfile) -> Result<Option<String>, String> {
    shell::converge(&apply_script(profile))?;
    Ok(None)
}

//! Profile loading and validation.
//!
//! Parses an optional `cimentar.yaml` override file and validates
//! structural constraints:
//! - Version must be "1.0"
//! - Target directories must be absolute
//! - URLs must be http(s)
//! - Names and the interpreter pin must be non-empty

use super::types::InstallProfile;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a profile file from disk.
pub fn parse_profile_file(path: &Path) -> Result<InstallProfile, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_profile(&content)
}

/// Parse a profile from a YAML string. Missing fields take the stock
/// defaults.
pub fn parse_profile(yaml: &str) -> Result<InstallProfile, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Load the effective profile: the given override file, or stock defaults
/// when none is supplied.
pub fn load_profile(path: Option<&Path>) -> Result<InstallProfile, String> {
    match path {
        Some(p) => parse_profile_file(p),
        None => Ok(InstallProfile::default()),
    }
}

/// Validate a profile. Returns a list of errors (empty = valid).
pub fn validate_profile(profile: &InstallProfile) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if profile.version != "1.0" {
        errors.push(ValidationError {
            message: format!("version must be \"1.0\", got \"{}\"", profile.version),
        });
    }

    for (field, value) in [
        ("name", &profile.name),
        ("service_name", &profile.service_name),
        ("env_name", &profile.env_name),
        ("python_version", &profile.python_version),
        ("manifest", &profile.manifest),
        ("control_prefix", &profile.control_prefix),
    ] {
        if value.is_empty() {
            errors.push(ValidationError {
                message: format!("{} must not be empty", field),
            });
        }
    }

    for (field, value) in [
        ("archive_url", &profile.archive_url),
        ("conda_installer_url", &profile.conda_installer_url),
        ("docker_key_url", &profile.docker_key_url),
        ("docker_repo_url", &profile.docker_repo_url),
        ("endpoint", &profile.endpoint),
    ] {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            errors.push(ValidationError {
                message: format!("{} must be an http(s) URL, got \"{}\"", field, value),
            });
        }
    }

    for (field, value) in [
        ("install_dir", &profile.install_dir),
        ("conda_root", &profile.conda_root),
        ("unit_dir", &profile.unit_dir),
        ("bin_dir", &profile.bin_dir),
        ("keyring_path", &profile.keyring_path),
        ("apt_source_path", &profile.apt_source_path),
    ] {
        if !value.is_absolute() {
            errors.push(ValidationError {
                message: format!("{} must be an absolute path, got \"{}\"", field, value.display()),
            });
        }
    }

    for (field, value) in [
        ("archive_sha256", &profile.archive_sha256),
        ("conda_installer_sha256", &profile.conda_installer_sha256),
    ] {
        if let Some(hex) = value {
            if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                errors.push(ValidationError {
                    message: format!("{} must be 64 hex characters", field),
                });
            }
        }
    }

    if profile.start_wait_secs == 0 || profile.start_wait_secs > 600 {
        errors.push(ValidationError {
            message: format!(
                "start_wait_secs must be within 1..=600, got {}",
                profile.start_wait_secs
            ),
        });
    }

    errors
}

/// Template written by `cimentar init` — stock defaults, ready to edit.
pub fn default_profile_template() -> String {
    r#"version: "1.0"
name: code-execution-api
display_name: Code Execution API
description: "Managed by cimentar"

archive_url: https://github.com/SohamMhatre09/Code-Execution-API/archive/refs/heads/main.zip
# archive_sha256: <64 hex chars — uncomment to pin the archive>
install_dir: /opt/code-execution-api

conda_root: /opt/miniconda3
conda_installer_url: https://repo.anaconda.com/miniconda/Miniconda3-latest-Linux-x86_64.sh
# conda_installer_sha256: <64 hex chars — uncomment to pin the installer>
env_name: code_execution_api
python_version: "3.11"
manifest: requirements.txt

service_name: code-execution-api
unit_dir: /etc/systemd/system
bin_dir: /usr/local/bin
control_prefix: code-api

docker_key_url: https://download.docker.com/linux/ubuntu/gpg
docker_repo_url: https://download.docker.com/linux/ubuntu
keyring_path: /etc/apt/keyrings/docker.gpg
apt_source_path: /etc/apt/sources.list.d/docker.list

endpoint: http://localhost:8000
start_wait_secs: 10
"#
    .to_string()
}

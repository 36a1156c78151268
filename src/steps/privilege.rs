//! Privilege guard — the run must hold root.

/// Exit 0 only for effective uid 0.
pub fn check_script() -> String {
    "test \"$(id -u)\" -eq 0".to_string()
}

/// Message shown when the guard fails. The run aborts before touching
/// package sources, the network, or the filesystem.
pub fn denied_message() -> String {
    "administrator privileges are required (effective uid is not 0) — re-run with sudo"
        .to_string()
}

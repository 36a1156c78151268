//! Local shell execution for generated provisioning scripts.
//!
//! Every step that converges through the host's own tools (apt, conda,
//! systemctl, docker) renders a script and pipes it through here. bash,
//! not sh/dash: the generated scripts rely on `set -o pipefail`.

use std::io::Write;
use std::process::{Command, Stdio};

/// Output from executing a script.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Pipe a script into bash and capture its output.
pub fn run_script(script: &str) -> Result<ExecOutput, String> {
    let mut child = Command::new("bash")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("cannot spawn bash: {}", e))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| "bash stdin unavailable".to_string())?;
    stdin
        .write_all(script.as_bytes())
        .map_err(|e| format!("cannot feed script to bash: {}", e))?;
    // Close the pipe so bash sees EOF.
    drop(stdin);

    let output = child
        .wait_with_output()
        .map_err(|e| format!("bash did not finish: {}", e))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run a presence check. Exit 0 means the desired state already holds.
pub fn check_passes(script: &str) -> Result<bool, String> {
    Ok(run_script(script)?.success())
}

/// Run a converge script, mapping a non-zero exit into the step failure
/// format recorded in the ledger.
pub fn converge(script: &str) -> Result<(), String> {
    let out = run_script(script)?;
    if out.success() {
        Ok(())
    } else {
        Err(format!("exit code {}: {}", out.exit_code, out.stderr.trim()))
    }
}

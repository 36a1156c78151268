//! Step ledger management — load, save (atomic), path derivation.

use super::types::StepLedger;
use std::path::{Path, PathBuf};

/// Derive the ledger path within the state directory.
pub fn ledger_path(state_dir: &Path) -> PathBuf {
    state_dir.join("ledger.yaml")
}

/// Load the ledger. Returns None if the file doesn't exist.
pub fn load_ledger(state_dir: &Path) -> Result<Option<StepLedger>, String> {
    let path = ledger_path(state_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let ledger: StepLedger = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("invalid ledger {}: {}", path.display(), e))?;
    Ok(Some(ledger))
}

/// Save the ledger atomically (write to temp, then rename).
pub fn save_ledger(state_dir: &Path, ledger: &StepLedger) -> Result<(), String> {
    let path = ledger_path(state_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
    }

    let yaml =
        serde_yaml_ng::to_string(ledger).map_err(|e| format!("serialize error: {}", e))?;

    let tmp_path = path.with_extension("yaml.tmp");
    std::fs::write(&tmp_path, &yaml)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, &path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;

    Ok(())
}

/// Create a fresh ledger for this host.
pub fn new_ledger(project: &str) -> StepLedger {
    use crate::journal::eventlog::now_iso8601;
    StepLedger {
        schema: "1.0".to_string(),
        project: project.to_string(),
        host: local_hostname(),
        generated_at: now_iso8601(),
        generator: format!("cimentar {}", env!("CARGO_PKG_VERSION")),
        steps: indexmap::IndexMap::new(),
    }
}

fn local_hostname() -> String {
    std::fs::read_to_string("/etc/hostname")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "localhost".to_string())
}

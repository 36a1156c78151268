//! Append-only JSONL provenance event log.

use crate::core::types::{ProvisionEvent, TimestampedEvent};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate an ISO 8601 UTC timestamp.
pub fn now_iso8601() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Run IDs sort by start time when grepping the event log:
/// `run-<UTC stamp>-<pid>`.
pub fn new_run_id() -> String {
    format!(
        "run-{}-{:04x}",
        chrono::Utc::now().format("%Y%m%d%H%M%S"),
        std::process::id() & 0xffff
    )
}

/// Derive the event log path.
pub fn event_log_path(state_dir: &Path) -> PathBuf {
    state_dir.join("events.jsonl")
}

/// Append an event to the log.
pub fn append_event(state_dir: &Path, event: ProvisionEvent) -> Result<(), String> {
    let path = event_log_path(state_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("cannot create state dir: {}", e))?;
    }

    let te = TimestampedEvent {
        ts: now_iso8601(),
        event,
    };
    let json = serde_json::to_string(&te).map_err(|e| format!("JSON serialize error: {}", e))?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("cannot open event log {}: {}", path.display(), e))?;

    writeln!(file, "{}", json).map_err(|e| format!("write error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_iso8601() {
        let ts = now_iso8601();
        assert!(ts.starts_with("20"));
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('T'));
    }

    #[test]
    fn test_new_run_id_shape() {
        let id = new_run_id();
        assert!(id.starts_with("run-20"));
        let parts: Vec<_> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        // UTC stamp: YYYYMMDDHHMMSS
        assert_eq!(parts[1].len(), 14);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_event_log_path() {
        let p = event_log_path(Path::new("/var/lib/cimentar"));
        assert_eq!(p, PathBuf::from("/var/lib/cimentar/events.jsonl"));
    }

    #[test]
    fn test_append_event() {
        let dir = tempfile::tempdir().unwrap();
        let event = ProvisionEvent::RunStarted {
            run_id: "r-abc".to_string(),
            generator: "cimentar 0.3.2".to_string(),
        };
        append_event(dir.path(), event).unwrap();

        let content = std::fs::read_to_string(dir.path().join("events.jsonl")).unwrap();
        assert!(content.contains("run_started"));
        assert!(content.contains("r-abc"));
    }

    #[test]
    fn test_append_multiple() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            let event = ProvisionEvent::StepConverged {
                step: format!("step-{}", i),
                duration_seconds: 1.0,
                hash: "blake3:xxx".to_string(),
            };
            append_event(dir.path(), event).unwrap();
        }
        let content = std::fs::read_to_string(dir.path().join("events.jsonl")).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        // Each line is standalone JSON with a timestamp
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("ts").is_some());
        }
    }
}

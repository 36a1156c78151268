//! Control scripts step — three fixed wrappers on the system path, each
//! proxying one service-manager action. Always overwritten.

use crate::core::types::InstallProfile;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

/// The three scripts as (file name, content), in start/stop/status order.
pub fn scripts(profile: &InstallProfile) -> [(String, String); 3] {
    let [start_name, stop_name, status_name] = profile.control_script_names();
    let display = &profile.display_name;
    let service = &profile.service_name;
    let endpoint = &profile.endpoint;

    let start = format!(
        "#!/usr/bin/env bash\n\
         echo \"Starting {display}...\"\n\
         systemctl start '{service}'\n\
         echo \"{display} is running at {endpoint}\"\n"
    );
    let stop = format!(
        "#!/usr/bin/env bash\n\
         echo \"Stopping {display}...\"\n\
         systemctl stop '{service}'\n\
         echo \"{display} has been stopped.\"\n"
    );
    let status = format!(
        "#!/usr/bin/env bash\n\
         exec systemctl status '{service}'\n"
    );

    [(start_name, start), (stop_name, stop), (status_name, status)]
}

/// Write all three into the bin dir, mode 0755.
pub fn write_scripts(profile: &InstallProfile) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(&profile.bin_dir)
        .map_err(|e| format!("cannot create dir {}: {}", profile.bin_dir.display(), e))?;

    let mut written = Vec::new();
    for (name, content) in scripts(profile) {
        let path = profile.bin_dir.join(&name);
        std::fs::write(&path, content)
            .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| format!("cannot chmod {}: {}", path.display(), e))?;
        written.push(path);
    }
    Ok(written)
}

pub fn apply(profile: &InstallProfile) -> Result<Option<String>, String> {
    write_scripts(profile)?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_script_names_one_action() {
        let [(_, start), (_, stop), (_, status)] = scripts(&InstallProfile::default());
        assert!(start.contains("systemctl start 'code-execution-api'"));
        assert!(!start.contains("systemctl stop"));
        assert!(stop.contains("systemctl stop 'code-execution-api'"));
        assert!(!stop.contains("systemctl start"));
        assert!(status.contains("systemctl status 'code-execution-api'"));
    }

    #[test]
    fn test_confirmation_messages() {
        let [(_, start), (_, stop), _] = scripts(&InstallProfile::default());
        assert!(start.contains("Starting Code Execution API..."));
        assert!(start.contains("is running at http://localhost:8000"));
        assert!(stop.contains("has been stopped."));
    }

    #[test]
    fn test_exactly_three_executables_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = InstallProfile::default();
        profile.bin_dir = dir.path().to_path_buf();

        let written = write_scripts(&profile).unwrap();
        assert_eq!(written.len(), 3);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 3);

        for path in &written {
            let mode = std::fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755, "{} not executable", path.display());
            let content = std::fs::read_to_string(path).unwrap();
            assert!(content.starts_with("#!/usr/bin/env bash"));
        }
    }

    #[test]
    fn test_scripts_overwritten_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = InstallProfile::default();
        profile.bin_dir = dir.path().to_path_buf();

        let stale = dir.path().join("code-api-start");
        std::fs::write(&stale, "stale wrapper").unwrap();

        write_scripts(&profile).unwrap();
        let content = std::fs::read_to_string(&stale).unwrap();
        assert!(!content.contains("stale wrapper"));
        assert!(content.contains("systemctl start"));
    }
}

//! Project archive step — fetch the zip, extract it, sync the single
//! top-level directory into the install dir.

use crate::core::types::InstallProfile;
use crate::fetch;
use crate::journal::hasher;
use std::fs;
use std::path::{Path, PathBuf};

/// Download into a scratch dir, extract, locate the single top-level
/// directory and copy its contents over the install dir. Same-named
/// entries are replaced; anything else already present is left alone.
pub fn apply(profile: &InstallProfile) -> Result<Option<String>, String> {
    let scratch = tempfile::tempdir().map_err(|e| format!("cannot create scratch dir: {}", e))?;
    let zip_path = scratch.path().join("project.zip");

    fetch::download(
        &profile.archive_url,
        &zip_path,
        profile.archive_sha256.as_deref(),
    )?;
    let artifact = hasher::artifact_fingerprint(&zip_path)?;

    let extracted = scratch.path().join("extracted");
    extract_archive(&zip_path, &extracted)?;
    let top = single_top_level(&extracted)?;
    sync_tree(&top, &profile.install_dir)?;

    Ok(Some(format!("archive {}", artifact)))
}

/// Extract a zip archive. Empty or malformed archives are errors, not
/// silent no-ops.
pub fn extract_archive(zip_path: &Path, dest: &Path) -> Result<(), String> {
    let file = fs::File::open(zip_path)
        .map_err(|e| format!("cannot open {}: {}", zip_path.display(), e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| format!("malformed archive {}: {}", zip_path.display(), e))?;
    if archive.len() == 0 {
        return Err(format!("archive {} is empty", zip_path.display()));
    }
    fs::create_dir_all(dest)
        .map_err(|e| format!("cannot create dir {}: {}", dest.display(), e))?;
    archive
        .extract(dest)
        .map_err(|e| format!("extract error for {}: {}", zip_path.display(), e))
}

/// The extracted tree must contain exactly one top-level directory (the
/// forge's `<repo>-<branch>/` wrapper).
pub fn single_top_level(dir: &Path) -> Result<PathBuf, String> {
    let entries: Vec<_> = fs::read_dir(dir)
        .map_err(|e| format!("cannot read dir {}: {}", dir.display(), e))?
        .filter_map(|e| e.ok())
        .collect();

    match entries.as_slice() {
        [single] if single.path().is_dir() => Ok(single.path()),
        _ => Err(format!(
            "expected exactly one top-level directory in the archive, found {} entries",
            entries.len()
        )),
    }
}

/// Copy `src`'s children into `dst`, replacing same-named entries.
pub fn sync_tree(src: &Path, dst: &Path) -> Result<(), String> {
    fs::create_dir_all(dst).map_err(|e| format!("cannot create dir {}: {}", dst.display(), e))?;

    for entry in fs::read_dir(src)
        .map_err(|e| format!("cannot read dir {}: {}", src.display(), e))?
        .filter_map(|e| e.ok())
    {
        let source = entry.path();
        let target = dst.join(entry.file_name());

        if target.exists() {
            if target.is_dir() {
                fs::remove_dir_all(&target)
                    .map_err(|e| format!("cannot replace {}: {}", target.display(), e))?;
            } else {
                fs::remove_file(&target)
                    .map_err(|e| format!("cannot replace {}: {}", target.display(), e))?;
            }
        }

        if source.is_dir() {
            copy_dir_all(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(|e| {
                format!(
                    "cannot copy {} → {}: {}",
                    source.display(),
                    target.display(),
                    e
                )
            })?;
        }
    }

    Ok(())
}

fn copy_dir_all(src: &Path, dst: &Path) -> Result<(), String> {
    fs::create_dir_all(dst).map_err(|e| format!("cannot create dir {}: {}", dst.display(), e))?;
    for entry in fs::read_dir(src)
        .map_err(|e| format!("cannot read dir {}: {}", src.display(), e))?
        .filter_map(|e| e.ok())
    {
        let source = entry.path();
        let target = dst.join(entry.file_name());
        if source.is_dir() {
            copy_dir_all(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(|e| {
                format!(
                    "cannot copy {} → {}: {}",
                    source.display(),
                    target.display(),
                    e
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_zip(path: &Path, top_dirs: &[&str]) {
        let file = fs::File::create(path).unwrap();
        let mut zw = zip::ZipWriter::new(file);
        let opts = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for top in top_dirs {
            zw.add_directory(format!("{}/", top), opts).unwrap();
            zw.start_file(format!("{}/requirements.txt", top), opts)
                .unwrap();
            zw.write_all(b"flask==3.0\n").unwrap();
            zw.add_directory(format!("{}/app/", top), opts).unwrap();
            zw.start_file(format!("{}/app/main.py", top), opts).unwrap();
            zw.write_all(b"print('ok')\n").unwrap();
        }
        zw.finish().unwrap();
    }

    #[test]
    fn test_extract_and_locate_single_top_dir() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("project.zip");
        write_test_zip(&zip_path, &["code-execution-api-main"]);

        let dest = dir.path().join("extracted");
        extract_archive(&zip_path, &dest).unwrap();

        let top = single_top_level(&dest).unwrap();
        assert!(top.ends_with("code-execution-api-main"));
        assert!(top.join("requirements.txt").is_file());
        assert!(top.join("app").join("main.py").is_file());
    }

    #[test]
    fn test_extract_malformed_archive() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("broken.zip");
        fs::write(&zip_path, b"this is not a zip").unwrap();

        let result = extract_archive(&zip_path, &dir.path().join("out"));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("malformed archive"));
    }

    #[test]
    fn test_extract_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("empty.zip");
        let file = fs::File::create(&zip_path).unwrap();
        let zw = zip::ZipWriter::new(file);
        zw.finish().unwrap();

        let result = extract_archive(&zip_path, &dir.path().join("out"));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("empty"));
    }

    #[test]
    fn test_single_top_level_rejects_multiple() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("two.zip");
        write_test_zip(&zip_path, &["one", "two"]);

        let dest = dir.path().join("extracted");
        extract_archive(&zip_path, &dest).unwrap();
        let result = single_top_level(&dest);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("exactly one top-level directory"));
    }

    #[test]
    fn test_single_top_level_rejects_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = single_top_level(dir.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("found 0 entries"));
    }

    #[test]
    fn test_single_top_level_rejects_lone_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README"), "flat archive").unwrap();
        assert!(single_top_level(dir.path()).is_err());
    }

    #[test]
    fn test_sync_tree_overwrites_same_names_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("install");

        fs::create_dir_all(src.join("app")).unwrap();
        fs::write(src.join("requirements.txt"), "new deps").unwrap();
        fs::write(src.join("app").join("main.py"), "new code").unwrap();

        // Pre-existing install tree: one stale same-named file, one stale
        // same-named dir, and one unrelated file that must survive.
        fs::create_dir_all(dst.join("app").join("old")).unwrap();
        fs::write(dst.join("requirements.txt"), "old deps").unwrap();
        fs::write(dst.join("local-config.yaml"), "keep me").unwrap();

        sync_tree(&src, &dst).unwrap();

        assert_eq!(
            fs::read_to_string(dst.join("requirements.txt")).unwrap(),
            "new deps"
        );
        assert_eq!(
            fs::read_to_string(dst.join("app").join("main.py")).unwrap(),
            "new code"
        );
        // Replaced wholesale, not merged
        assert!(!dst.join("app").join("old").exists());
        // Untouched
        assert_eq!(
            fs::read_to_string(dst.join("local-config.yaml")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn test_sync_tree_creates_missing_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();

        let dst = dir.path().join("deep").join("install");
        sync_tree(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
    }
}

//! HTTP artifact fetching — blocking GET streamed to disk with a byte
//! progress bar, optional fail-closed sha256 verification.
//!
//! No retries and no timeout beyond the client's own: a fetch either
//! lands on disk or surfaces as the step's failure.

use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

const STREAM_BUF_SIZE: usize = 65536;

/// Download `url` to `dest`. Returns the byte count written.
///
/// When `expected_sha256` is set the artifact is verified after the
/// download; a mismatch removes the file and fails the fetch.
pub fn download(url: &str, dest: &Path, expected_sha256: Option<&str>) -> Result<u64, String> {
    let response = match ureq::get(url).call() {
        Ok(r) => r,
        Err(ureq::Error::Status(code, _)) => {
            return Err(format!("download failed: HTTP {} ({})", code, url));
        }
        Err(_) => {
            return Err(format!("download failed: no network connection ({})", url));
        }
    };

    let total: Option<u64> = response
        .header("Content-Length")
        .and_then(|v| v.parse().ok());
    let bar = progress_bar(total, remote_file_name(url));

    let mut reader = response.into_reader();
    let mut file = std::fs::File::create(dest)
        .map_err(|e| format!("cannot create {}: {}", dest.display(), e))?;

    let mut buf = [0u8; STREAM_BUF_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| format!("read error from {}: {}", url, e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| format!("write error {}: {}", dest.display(), e))?;
        written += n as u64;
        bar.inc(n as u64);
    }
    bar.finish_and_clear();

    if let Some(expected) = expected_sha256 {
        if let Err(e) = verify_sha256(dest, expected) {
            let _ = std::fs::remove_file(dest);
            return Err(e);
        }
    }

    Ok(written)
}

/// sha256 of a file as lowercase hex.
pub fn sha256_hex(path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; STREAM_BUF_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| format!("read error {}: {}", path.display(), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

/// Compare a file against an expected sha256 hex digest; fails closed.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<(), String> {
    let actual = sha256_hex(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(format!(
            "sha256 mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        ))
    }
}

/// Lowercase hex of a byte slice.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Last path segment of a URL, for progress labels.
fn remote_file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

fn progress_bar(total: Option<u64>, msg: &str) -> ProgressBar {
    match total {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::with_template(
                    "  {msg}\n    {bar:40.cyan/dim} {percent}%  {bytes}/{total_bytes}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━─"),
            );
            pb.set_message(msg.to_string());
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg} {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(msg.to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        }
    }
}

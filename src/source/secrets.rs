//! Secret-file source.
//!
//! One regular file per parameter: the filename is the key (case-insensitive,
//! stored lowercased) and the file content is the value. Trailing whitespace
//! is trimmed, matching the usual trailing-newline convention of secret
//! mounts.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

/// Reads the secret file for `name`, if present and readable.
pub(super) fn read(root: &Path, name: &str) -> Option<String> {
    let path = root.join(name.to_lowercase());
    match fs::read_to_string(&path) {
        Ok(contents) => Some(contents.trim_end().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable secret file");
            None
        }
    }
}

/// Enumerates every regular file under `root` as a key/value entry.
pub(super) fn scan(root: &Path) -> Vec<(String, String)> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "secrets directory not available");
            return Vec::new();
        }
    };

    let mut secrets = Vec::new();

    for entry in entries.flatten() {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            warn!(path = %entry.path().display(), "secrets directory has a subdirectory, skipping");
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        match fs::read_to_string(entry.path()) {
            Ok(contents) => secrets.push((name, contents.trim_end().to_string())),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "unreadable secret file");
            }
        }
    }

    secrets
}

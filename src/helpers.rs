use std::path::{Path, PathBuf};
use std::time::Duration;

/// Normalizes a path argument received from the peer.
///
/// Peers may send paths with or without a leading `/` or `files/` prefix;
/// both are stripped before resolving against the configured file root.
/// Traversal sequences are removed outright.
pub fn normalize_remote_path(path: &str) -> String {
    let cleaned = path.replace("../", "").replace("..\\", "");
    let trimmed = cleaned.trim_start_matches('/');
    let trimmed = trimmed.strip_prefix("files/").unwrap_or(trimmed);
    trimmed.to_string()
}

/// Resolves a peer-supplied path under the configured file root.
pub fn resolve_path(root: &Path, path: &str) -> PathBuf {
    root.join(normalize_remote_path(path))
}

/// Uptime as `HH:MM:SS`.
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

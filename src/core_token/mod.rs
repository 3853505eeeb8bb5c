//! Durable session token store.
//!
//! One opaque token, generated once per client installation and persisted at
//! a fixed location. Re-sending it on every connection attempt is what lets
//! the server recognize the same logical session after a restart on either
//! side.

use std::io;
use std::path::Path;

use log::debug;
use uuid::Uuid;

/// Reads the persisted token, or generates and persists a fresh one when the
/// file is missing or empty.
pub fn load_or_create(path: &Path) -> io::Result<String> {
    if path.is_file() {
        let token = std::fs::read_to_string(path)?;
        let token = token.trim();
        if !token.is_empty() {
            debug!("Loaded session token from {}", path.display());
            return Ok(token.to_string());
        }
    }
    let token = Uuid::new_v4().to_string();
    std::fs::write(path, &token)?;
    debug!("Persisted new session token to {}", path.display());
    Ok(token)
}

/// Forgets the persisted token; the next run starts a fresh session.
pub fn clear(path: &Path) -> io::Result<()> {
    if path.is_file() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_once_and_reads_back_stably() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        let first = load_or_create(&path).unwrap();
        let second = load_or_create(&path).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn regenerates_after_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        let first = load_or_create(&path).unwrap();
        clear(&path).unwrap();
        let second = load_or_create(&path).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        clear(&path).unwrap();
        clear(&path).unwrap();
    }
}

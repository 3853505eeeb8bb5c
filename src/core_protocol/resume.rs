use serde::{Deserialize, Serialize};

use crate::core_protocol::error::ProtocolError;

/// Step-5 payload of the resumption handshake: what the server knows about
/// the interrupted transfer.
///
/// `file_size` is the byte size of the *server's* copy - the full size for a
/// download (the server holds the source), the bytes received so far for an
/// upload (the server holds the partial target). Step 9 answers with the
/// size of the client's copy; each side derives its resume offset from the
/// two, never from tracked counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeInfo {
    pub download: bool,
    pub client_file_path: String,
    pub file_size: u64,
}

impl ResumeInfo {
    pub fn to_line(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::BadMessage(e.to_string()))
    }

    pub fn from_line(line: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(line).map_err(|e| ProtocolError::BadMessage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_one_json_line() {
        let info = ResumeInfo {
            download: true,
            client_file_path: "files/a.txt".to_string(),
            file_size: 10_000,
        };
        let line = info.to_line().unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(ResumeInfo::from_line(&line).unwrap(), info);
    }

    #[test]
    fn rejects_garbage() {
        assert!(ResumeInfo::from_line("not json").is_err());
    }
}

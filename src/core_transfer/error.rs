use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;

use crate::core_protocol::ProtocolError;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },

    #[error("bad datagram frame: {0}")]
    BadFrame(String),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),
}

impl TransferError {
    /// Whether this error means the connection itself is gone. Disconnects
    /// end the command loop and leave the session's transfer state set, which
    /// is exactly what the next reconnect's resumption handshake looks for.
    pub fn is_disconnect(&self) -> bool {
        match self {
            TransferError::Protocol(ProtocolError::PeerClosed) => true,
            TransferError::Protocol(ProtocolError::Io(e)) | TransferError::Io(e) => matches!(
                e.kind(),
                ErrorKind::BrokenPipe
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
                    | ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_closed_is_a_disconnect() {
        assert!(TransferError::Protocol(ProtocolError::PeerClosed).is_disconnect());
    }

    #[test]
    fn broken_pipe_is_a_disconnect() {
        let err = TransferError::Io(std::io::Error::from(ErrorKind::BrokenPipe));
        assert!(err.is_disconnect());
    }

    #[test]
    fn sequence_gap_is_not_a_disconnect() {
        let err = TransferError::SequenceGap {
            expected: 3,
            got: 5,
        };
        assert!(!err.is_disconnect());
    }
}

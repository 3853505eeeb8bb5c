use thiserror::Error;

use crate::core_protocol::code::ControlCode;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("peer closed the connection")]
    PeerClosed,

    #[error("protocol desync: expected {expected:?}, got {got:?}")]
    Desync {
        expected: ControlCode,
        got: ControlCode,
    },

    #[error("bad size field: {0:?}")]
    BadSize(String),

    #[error("bad handshake message: {0}")]
    BadMessage(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

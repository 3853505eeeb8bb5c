/// Single-byte control codes exchanged between client and server.
///
/// `None` never goes on the wire: it is the local sentinel for "no byte
/// arrived before the timeout" returned by the bounded control reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCode {
    Ok,
    Err,
    CmdStart,
    CmdEnd,
    NotFound,
    Unauthorized,
    None,
}

impl ControlCode {
    pub fn as_byte(self) -> u8 {
        match self {
            ControlCode::Ok => 0x01,
            ControlCode::Err => 0x02,
            ControlCode::CmdStart => 0x03,
            ControlCode::CmdEnd => 0x04,
            ControlCode::NotFound => 0x05,
            ControlCode::Unauthorized => 0x06,
            ControlCode::None => 0x00,
        }
    }

    /// Any byte outside the closed set counts as no response at all.
    pub fn from_byte(byte: u8) -> ControlCode {
        match byte {
            0x01 => ControlCode::Ok,
            0x02 => ControlCode::Err,
            0x03 => ControlCode::CmdStart,
            0x04 => ControlCode::CmdEnd,
            0x05 => ControlCode::NotFound,
            0x06 => ControlCode::Unauthorized,
            _ => ControlCode::None,
        }
    }
}

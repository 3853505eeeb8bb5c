use std::net::SocketAddr;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;

use crate::core_protocol::code::ControlCode;
use crate::core_protocol::error::ProtocolError;

/// One TCP connection, wrapped in a single buffered reader.
///
/// Line reads, control-byte reads and chunk reads all drain the same buffer;
/// constructing a fresh reader per read would silently drop buffered bytes.
pub struct Connection {
    stream: BufReader<TcpStream>,
    peer: SocketAddr,
}

impl Connection {
    pub fn new(stream: TcpStream) -> std::io::Result<Self> {
        let peer = stream.peer_addr()?;
        Ok(Self {
            stream: BufReader::new(stream),
            peer,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Reads one `\n`-terminated line, without the trailing line ending.
    /// A zero-length read means the peer closed the connection.
    pub async fn read_line(&mut self) -> Result<String, ProtocolError> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line).await?;
        if n == 0 {
            return Err(ProtocolError::PeerClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub async fn send_line(&mut self, msg: &str) -> Result<(), ProtocolError> {
        self.stream.write_all(msg.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn send_raw(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Accumulates exactly `buf.len()` bytes. A short read is normal stream
    /// behavior; a zero-length read mid-chunk is a dropped connection.
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.stream.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(ProtocolError::PeerClosed);
            }
            filled += n;
        }
        Ok(())
    }

    /// Best-effort read of one control byte. Timeout and I/O errors both
    /// resolve to `ControlCode::None`; the caller decides whether a missing
    /// byte matters.
    pub async fn recv_control(&mut self, timeout: Duration) -> ControlCode {
        let mut byte = [0u8; 1];
        match time::timeout(timeout, self.stream.read_exact(&mut byte)).await {
            Ok(Ok(_)) => ControlCode::from_byte(byte[0]),
            _ => ControlCode::None,
        }
    }

    /// Best-effort send of one control byte; errors are swallowed, the
    /// synchronization is advisory flow control, not a reliability mechanism.
    pub async fn send_control(&mut self, code: ControlCode, timeout: Duration) {
        let result = time::timeout(timeout, async {
            self.stream.write_all(&[code.as_byte()]).await?;
            self.stream.flush().await
        })
        .await;
        if !matches!(result, Ok(Ok(()))) {
            debug!("control byte {:?} not delivered to {}", code, self.peer);
        }
    }

    /// Strict variant for the transfer engines: a missing or wrong code
    /// aborts the transfer.
    pub async fn expect_control(
        &mut self,
        expected: ControlCode,
        timeout: Duration,
    ) -> Result<(), ProtocolError> {
        match self.recv_control(timeout).await {
            got if got == expected => Ok(()),
            got => Err(ProtocolError::Desync { expected, got }),
        }
    }

    /// Peeks at the next buffered byte without consuming it, so a caller can
    /// tell a control sentinel apart from the start of a text line. `None`
    /// when nothing arrives within `timeout` (or at EOF).
    pub async fn peek(&mut self, timeout: Duration) -> Option<u8> {
        match time::timeout(timeout, self.stream.fill_buf()).await {
            Ok(Ok(buf)) => buf.first().copied(),
            _ => None,
        }
    }
}

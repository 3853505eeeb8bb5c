// src/constants.rs

use std::time::Duration;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;
pub const DEFAULT_PACKETS_PER_CHECK: u64 = 10;

/// Bounded wait for an advisory control byte. Expiry yields `ControlCode::None`.
pub const SYNC_RECV_TIMEOUT: Duration = Duration::from_secs(1);
/// Bounded wait for a best-effort control-byte send.
pub const SYNC_SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// UDP checkpoint cadence: one stop-and-wait acknowledgment every N datagrams.
pub const UDP_ACK_INTERVAL: u64 = 10;
pub const UDP_ACK_TIMEOUT: Duration = Duration::from_secs(1);
pub const UDP_RECV_TIMEOUT: Duration = Duration::from_secs(5);
pub const UDP_RENDEZVOUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Room for the ASCII `<seq>:` prefix on top of a chunk in one datagram.
pub const UDP_FRAME_HEADROOM: usize = 24;

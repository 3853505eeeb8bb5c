//! Sequenced transfer over unreliable datagrams.
//!
//! Each data datagram carries an ASCII decimal sequence number, a `:`
//! separator and the raw chunk bytes. Sequence numbers start at 0 and
//! increment by one per datagram; they detect loss and reordering, they do
//! not address file offsets. Any gap aborts the transfer outright - there is
//! no retransmission and no resumption path on this transport. The only
//! backpressure is one stop-and-wait acknowledgment every
//! [`UDP_ACK_INTERVAL`] datagrams; everything in between is sent without
//! delay, so a slow receiver drops packets the sender never learns about.

use std::net::SocketAddr;
use std::path::Path;

use log::{info, warn};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UdpSocket;
use tokio::time;

use crate::constants::{
    UDP_ACK_INTERVAL, UDP_ACK_TIMEOUT, UDP_FRAME_HEADROOM, UDP_RECV_TIMEOUT,
    UDP_RENDEZVOUS_TIMEOUT,
};
use crate::core_transfer::error::TransferError;
use crate::core_transfer::progress::TransferProgress;
use crate::core_transfer::tcp::chunk_count;

const SYNC_PAYLOAD: &[u8] = b"SYNC";
const OK_PAYLOAD: &[u8] = b"OK";
const ACK_PAYLOAD: &[u8] = b"ACK";

pub fn frame(seq: u64, chunk: &[u8]) -> Vec<u8> {
    let mut datagram = format!("{}:", seq).into_bytes();
    datagram.extend_from_slice(chunk);
    datagram
}

pub fn parse_frame(datagram: &[u8]) -> Result<(u64, &[u8]), TransferError> {
    let sep = datagram
        .iter()
        .position(|&b| b == b':')
        .ok_or_else(|| TransferError::BadFrame("missing ':' separator".to_string()))?;
    let prefix = std::str::from_utf8(&datagram[..sep])
        .map_err(|_| TransferError::BadFrame("non-ascii sequence prefix".to_string()))?;
    let seq = prefix
        .parse()
        .map_err(|_| TransferError::BadFrame(format!("bad sequence number {:?}", prefix)))?;
    Ok((seq, &datagram[sep + 1..]))
}

/// Rendezvous, initiating side (always the client, which knows the server's
/// configured UDP port). Sends the sync datagram and waits for the answer;
/// returns the address to target for the rest of the transfer.
pub async fn initiate_rendezvous(
    sock: &UdpSocket,
    server: SocketAddr,
) -> Result<SocketAddr, TransferError> {
    sock.send_to(SYNC_PAYLOAD, server).await?;
    let mut buf = [0u8; 16];
    let (_, peer) = time::timeout(UDP_RENDEZVOUS_TIMEOUT, sock.recv_from(&mut buf))
        .await
        .map_err(|_| TransferError::Timeout("rendezvous answer"))??;
    Ok(peer)
}

/// Rendezvous, listening side. UDP has no connection state, so the peer's
/// ephemeral address must be learned from an inbound datagram before any
/// chunk can be targeted at the right port. The learned address is trusted
/// as-is; there is no authentication or replay protection on this transport.
pub async fn await_rendezvous(sock: &UdpSocket) -> Result<SocketAddr, TransferError> {
    let mut buf = [0u8; 16];
    let (_, peer) = time::timeout(UDP_RENDEZVOUS_TIMEOUT, sock.recv_from(&mut buf))
        .await
        .map_err(|_| TransferError::Timeout("rendezvous datagram"))??;
    sock.send_to(SYNC_PAYLOAD, peer).await?;
    Ok(peer)
}

/// Sends `path` to `peer` as framed datagrams.
pub async fn udp_send_file(
    sock: &UdpSocket,
    peer: SocketAddr,
    path: &Path,
    chunk_size: usize,
) -> Result<u64, TransferError> {
    let meta = tokio::fs::metadata(path).await?;
    if !meta.is_file() {
        return Err(TransferError::NotAFile(path.to_path_buf()));
    }
    let total = meta.len();
    sock.send_to(total.to_string().as_bytes(), peer).await?;
    let mut buf = vec![0u8; chunk_size + UDP_FRAME_HEADROOM];
    let (n, _) = time::timeout(UDP_RECV_TIMEOUT, sock.recv_from(&mut buf))
        .await
        .map_err(|_| TransferError::Timeout("size acknowledgment"))??;
    if &buf[..n] != OK_PAYLOAD {
        return Err(TransferError::BadFrame(
            "size announcement was not acknowledged".to_string(),
        ));
    }

    let mut file = File::open(path).await?;
    let count = chunk_count(total, chunk_size);
    info!(
        "Sending {} over UDP to {} ({} datagrams)",
        path.display(),
        peer,
        count
    );
    let progress = TransferProgress::new(count);
    let mut offset = 0u64;
    for seq in 0..count {
        let len = (total - offset).min(chunk_size as u64) as usize;
        file.read_exact(&mut buf[..len]).await?;
        sock.send_to(&frame(seq, &buf[..len]), peer).await?;
        offset += len as u64;
        if seq % UDP_ACK_INTERVAL == 0 {
            // the only backpressure this transport has; a timeout here is
            // tolerated, not retried
            let mut ack = [0u8; 16];
            let _ = time::timeout(UDP_ACK_TIMEOUT, sock.recv_from(&mut ack)).await;
        }
        progress.advance();
    }
    progress.finish();
    Ok(total)
}

/// Receives framed datagrams from `peer` into `path`, aborting on the first
/// sequence gap. Nothing is written past a gap.
pub async fn udp_recv_file(
    sock: &UdpSocket,
    peer: SocketAddr,
    path: &Path,
    chunk_size: usize,
) -> Result<u64, TransferError> {
    let mut buf = vec![0u8; chunk_size + UDP_FRAME_HEADROOM];
    let (n, _) = time::timeout(UDP_RECV_TIMEOUT, sock.recv_from(&mut buf))
        .await
        .map_err(|_| TransferError::Timeout("size announcement"))??;
    let announced = std::str::from_utf8(&buf[..n])
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| TransferError::BadFrame("bad size announcement".to_string()))?;
    sock.send_to(OK_PAYLOAD, peer).await?;

    let mut file = File::create(path).await?;
    let count = chunk_count(announced, chunk_size);
    info!(
        "Receiving {} over UDP from {} ({} datagrams)",
        path.display(),
        peer,
        count
    );
    let progress = TransferProgress::new(count);
    let mut received = 0u64;
    for expected in 0..count {
        let (n, _) = time::timeout(UDP_RECV_TIMEOUT, sock.recv_from(&mut buf))
            .await
            .map_err(|_| TransferError::Timeout("data datagram"))??;
        let (seq, payload) = parse_frame(&buf[..n])?;
        if seq != expected {
            return Err(TransferError::SequenceGap { expected, got: seq });
        }
        file.write_all(payload).await?;
        received += payload.len() as u64;
        if expected % UDP_ACK_INTERVAL == 0 {
            sock.send_to(ACK_PAYLOAD, peer).await?;
        }
        progress.advance();
    }
    file.flush().await?;
    progress.finish();
    if received != announced {
        warn!(
            "UDP transfer size mismatch: announced {}, received {}",
            announced, received
        );
    }
    Ok(received)
}

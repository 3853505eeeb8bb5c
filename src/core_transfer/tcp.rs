use std::io::SeekFrom;
use std::path::Path;

use log::{info, warn};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::constants::{SYNC_RECV_TIMEOUT, SYNC_SEND_TIMEOUT};
use crate::core_protocol::{Connection, ControlCode, ProtocolError};
use crate::core_transfer::error::TransferError;
use crate::core_transfer::progress::TransferProgress;

pub fn chunk_count(total: u64, chunk_size: usize) -> u64 {
    let chunk = chunk_size as u64;
    (total + chunk - 1) / chunk
}

/// Length of the chunk starting at `offset`.
///
/// At a chunk boundary this is a full chunk (ragged at the end of the file).
/// Mid-chunk - which only happens for the first chunk of a resumed transfer -
/// it is the distance to the next boundary, so the resumed stream realigns
/// and no byte is duplicated or skipped wherever the crash fell.
pub fn chunk_len(total: u64, offset: u64, chunk_size: usize) -> usize {
    let chunk = chunk_size as u64;
    let to_boundary = chunk - (offset % chunk);
    (total - offset).min(to_boundary) as usize
}

/// Number of engine iterations left when `done` bytes are already on disk.
pub fn chunks_remaining(total: u64, done: u64, chunk_size: usize) -> u64 {
    if done >= total {
        return 0;
    }
    let first = chunk_len(total, done, chunk_size) as u64;
    1 + chunk_count(total - done - first, chunk_size)
}

/// The shared sender loop; `done > 0` makes it the resume variant. The file
/// cursor must already sit at `done`.
///
/// With `ack_every > 0` the sender pauses at every `ack_every`-th iteration
/// for a pacing byte from the receiver; a timeout there is not an error, the
/// checkpoint throttles drift, it does not acknowledge delivery.
pub async fn send_chunks(
    conn: &mut Connection,
    file: &mut File,
    total: u64,
    done: u64,
    chunk_size: usize,
    ack_every: u64,
    progress: &TransferProgress,
) -> Result<(), TransferError> {
    let mut offset = done;
    let mut check = 0u64;
    let mut buf = vec![0u8; chunk_size];
    while offset < total {
        let len = chunk_len(total, offset, chunk_size);
        file.read_exact(&mut buf[..len]).await?;
        conn.send_raw(&buf[..len]).await?;
        if ack_every > 0 {
            if check % ack_every == 0 {
                conn.recv_control(SYNC_RECV_TIMEOUT).await;
            }
            check += 1;
        }
        offset += len as u64;
        progress.advance();
    }
    // one final ack from the receiver once it has flushed everything
    conn.recv_control(SYNC_RECV_TIMEOUT).await;
    progress.finish();
    Ok(())
}

/// The shared receiver loop, mirroring `send_chunks`. The file must be
/// truncated for a fresh transfer or opened in append mode for a resumed one.
pub async fn recv_chunks(
    conn: &mut Connection,
    file: &mut File,
    total: u64,
    done: u64,
    chunk_size: usize,
    ack_every: u64,
    progress: &TransferProgress,
) -> Result<(), TransferError> {
    let mut offset = done;
    let mut check = 0u64;
    let mut buf = vec![0u8; chunk_size];
    while offset < total {
        let len = chunk_len(total, offset, chunk_size);
        conn.read_chunk(&mut buf[..len]).await?;
        file.write_all(&buf[..len]).await?;
        if ack_every > 0 {
            if check % ack_every == 0 {
                conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
            }
            check += 1;
        }
        offset += len as u64;
        progress.advance();
    }
    file.flush().await?;
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    progress.finish();
    Ok(())
}

/// Sends a whole file: waits for the receiver's readiness byte, announces the
/// size as a decimal line, waits for the size acknowledgment, then streams
/// chunks. If either expected `Ok` does not arrive the transfer aborts before
/// any file byte is written to the stream.
pub async fn send_file(
    conn: &mut Connection,
    path: &Path,
    chunk_size: usize,
    ack_every: u64,
) -> Result<u64, TransferError> {
    let meta = tokio::fs::metadata(path).await?;
    if !meta.is_file() {
        return Err(TransferError::NotAFile(path.to_path_buf()));
    }
    let total = meta.len();
    conn.expect_control(ControlCode::Ok, SYNC_RECV_TIMEOUT).await?;
    conn.send_line(&total.to_string()).await?;
    conn.expect_control(ControlCode::Ok, SYNC_RECV_TIMEOUT).await?;
    let mut file = File::open(path).await?;
    info!("Sending {} ({} bytes)", path.display(), total);
    let progress = TransferProgress::new(chunk_count(total, chunk_size));
    send_chunks(conn, &mut file, total, 0, chunk_size, ack_every, &progress).await?;
    Ok(total)
}

/// Receives a whole file into `path`, truncating whatever was there.
pub async fn recv_file(
    conn: &mut Connection,
    path: &Path,
    chunk_size: usize,
    ack_every: u64,
) -> Result<u64, TransferError> {
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    let line = conn.read_line().await?;
    let total: u64 = line
        .trim()
        .parse()
        .map_err(|_| ProtocolError::BadSize(line.clone()))?;
    let mut file = match File::create(path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Can't create {}: {}", path.display(), e);
            conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await;
            return Err(e.into());
        }
    };
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    info!("Receiving {} ({} bytes)", path.display(), total);
    let progress = TransferProgress::new(chunk_count(total, chunk_size));
    recv_chunks(conn, &mut file, total, 0, chunk_size, ack_every, &progress).await?;
    Ok(total)
}

/// Resume variant of the send side: seeks past the bytes the receiver
/// already holds and streams the remainder.
pub async fn resume_send(
    conn: &mut Connection,
    path: &Path,
    total: u64,
    done: u64,
    chunk_size: usize,
    ack_every: u64,
) -> Result<(), TransferError> {
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(done)).await?;
    info!(
        "Resuming send of {} from byte {} of {}",
        path.display(),
        done,
        total
    );
    let progress = TransferProgress::new(chunks_remaining(total, done, chunk_size));
    send_chunks(conn, &mut file, total, done, chunk_size, ack_every, &progress).await
}

/// Resume variant of the receive side: appends to the partial file on disk.
pub async fn resume_recv(
    conn: &mut Connection,
    path: &Path,
    total: u64,
    done: u64,
    chunk_size: usize,
    ack_every: u64,
) -> Result<(), TransferError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    info!(
        "Resuming receive of {} from byte {} of {}",
        path.display(),
        done,
        total
    );
    let progress = TransferProgress::new(chunks_remaining(total, done, chunk_size));
    recv_chunks(conn, &mut file, total, done, chunk_size, ack_every, &progress).await
}

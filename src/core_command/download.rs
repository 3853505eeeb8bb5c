use std::path::Path;

use log::{info, warn};

use crate::config::Config;
use crate::constants::SYNC_SEND_TIMEOUT;
use crate::core_protocol::{Connection, ControlCode};
use crate::core_session::{Session, TransferKind};
use crate::core_transfer::{tcp, TransferError};
use crate::helpers::resolve_path;

/// Serves `download <remote_path> <local_path>`: validates, then streams the
/// requested file to the client over the TCP engine.
///
/// The session records the transfer direction and both paths before the
/// first byte; if the connection drops mid-stream they stay set, and the
/// next reconnect's handshake resumes from whatever the client got.
pub async fn handle_download(
    conn: &mut Connection,
    config: &Config,
    session: &mut Session,
) -> Result<(), TransferError> {
    if !session.parser.check_args(2) {
        warn!("download: wrong arguments");
        conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await;
        return Ok(());
    }
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    let remote = session.parser.arg(0).unwrap_or_default().to_string();
    let local = session.parser.arg(1).unwrap_or_default().to_string();
    let abs_path = resolve_path(Path::new(&config.server.files_dir), &remote);
    let is_file = tokio::fs::metadata(&abs_path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        warn!("download: no such file {}", abs_path.display());
        conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await;
        return Ok(());
    }
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    session.begin_transfer(TransferKind::Download, &remote, &local);
    match tcp::send_file(
        conn,
        &abs_path,
        config.transfer.chunk_size,
        config.transfer.ack_every(),
    )
    .await
    {
        Ok(total) => {
            info!("Sent {} ({} bytes)", abs_path.display(), total);
            session.finish_transfer();
            Ok(())
        }
        // a dropped connection leaves the transfer marked in-flight
        Err(e) if e.is_disconnect() => Err(e),
        Err(e) => {
            session.finish_transfer();
            Err(e)
        }
    }
}

use std::path::Path;

use log::{info, warn};
use tokio::net::UdpSocket;

use crate::config::Config;
use crate::constants::SYNC_SEND_TIMEOUT;
use crate::core_protocol::{Connection, ControlCode};
use crate::core_session::Session;
use crate::core_transfer::{udp, TransferError};
use crate::helpers::resolve_path;

/// Serves `udpdownload <remote_path> <local_path>`: argument and path checks
/// run on the TCP control connection, then the file goes out over the
/// sequenced datagram engine. UDP transfers are not resumable, so the
/// session's transfer state is left untouched.
pub async fn handle_udpdownload(
    conn: &mut Connection,
    config: &Config,
    session: &Session,
    udp_sock: &UdpSocket,
) -> Result<(), TransferError> {
    if !session.parser.check_args(2) {
        warn!("udpdownload: wrong arguments");
        conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await;
        return Ok(());
    }
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    let remote = session.parser.arg(0).unwrap_or_default();
    let abs_path = resolve_path(Path::new(&config.server.files_dir), remote);
    let is_file = tokio::fs::metadata(&abs_path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        warn!("udpdownload: no such file {}", abs_path.display());
        conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await;
        return Ok(());
    }
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    let peer = udp::await_rendezvous(udp_sock).await?;
    let total = udp::udp_send_file(udp_sock, peer, &abs_path, config.transfer.chunk_size).await?;
    info!("Sent {} over UDP ({} bytes)", abs_path.display(), total);
    Ok(())
}

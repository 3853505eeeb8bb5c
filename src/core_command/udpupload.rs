use std::path::Path;

use log::{info, warn};
use tokio::net::UdpSocket;

use crate::config::Config;
use crate::constants::{SYNC_RECV_TIMEOUT, SYNC_SEND_TIMEOUT};
use crate::core_protocol::{Connection, ControlCode};
use crate::core_session::Session;
use crate::core_transfer::{udp, TransferError};
use crate::helpers::resolve_path;

/// Serves `udpupload <remote_path> <local_path>`: the client streams a file
/// into the server's file root over the sequenced datagram engine.
pub async fn handle_udpupload(
    conn: &mut Connection,
    config: &Config,
    session: &Session,
    udp_sock: &UdpSocket,
) -> Result<(), TransferError> {
    if !session.parser.check_args(2) {
        warn!("udpupload: wrong arguments");
        conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await;
        return Ok(());
    }
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    // the client now reports whether its local source exists
    match conn.recv_control(SYNC_RECV_TIMEOUT).await {
        ControlCode::Ok => {}
        got => {
            warn!("udpupload: client aborted ({:?})", got);
            return Ok(());
        }
    }

    let remote = session.parser.arg(0).unwrap_or_default();
    let abs_path = resolve_path(Path::new(&config.server.files_dir), remote);

    let peer = udp::await_rendezvous(udp_sock).await?;
    let total = udp::udp_recv_file(udp_sock, peer, &abs_path, config.transfer.chunk_size).await?;
    info!("Stored {} over UDP ({} bytes)", abs_path.display(), total);
    Ok(())
}

use std::path::Path;

use log::{info, warn};

use crate::config::Config;
use crate::constants::{SYNC_RECV_TIMEOUT, SYNC_SEND_TIMEOUT};
use crate::core_protocol::{Connection, ControlCode};
use crate::core_session::{Session, TransferKind};
use crate::core_transfer::{tcp, TransferError};
use crate::helpers::resolve_path;

/// Serves `upload <remote_path> <local_path>`: the client streams a file
/// into the server's file root over the TCP engine.
pub async fn handle_upload(
    conn: &mut Connection,
    config: &Config,
    session: &mut Session,
) -> Result<(), TransferError> {
    if !session.parser.check_args(2) {
        warn!("upload: wrong arguments");
        conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await;
        return Ok(());
    }
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    // the client now reports whether its local source exists
    match conn.recv_control(SYNC_RECV_TIMEOUT).await {
        ControlCode::Ok => {}
        got => {
            warn!("upload: client aborted ({:?})", got);
            return Ok(());
        }
    }

    let remote = session.parser.arg(0).unwrap_or_default().to_string();
    let local = session.parser.arg(1).unwrap_or_default().to_string();
    let abs_path = resolve_path(Path::new(&config.server.files_dir), &remote);

    session.begin_transfer(TransferKind::Upload, &remote, &local);
    match tcp::recv_file(
        conn,
        &abs_path,
        config.transfer.chunk_size,
        config.transfer.ack_every(),
    )
    .await
    {
        Ok(total) => {
            info!("Stored {} ({} bytes)", abs_path.display(), total);
            session.finish_transfer();
            Ok(())
        }
        Err(e) if e.is_disconnect() => Err(e),
        Err(e) => {
            session.finish_transfer();
            Err(e)
        }
    }
}

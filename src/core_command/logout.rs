use log::warn;

use crate::core_protocol::Connection;
use crate::core_session::Session;
use crate::core_transfer::TransferError;

pub async fn handle_logout(
    conn: &mut Connection,
    session: &mut Session,
) -> Result<(), TransferError> {
    if !session.parser.check_args(0) {
        conn.send_line("Wrong arguments").await?;
        return Ok(());
    }
    conn.send_line("logging out...").await?;
    warn!("Handling logout...");
    session.active = false;
    Ok(())
}

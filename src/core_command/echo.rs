use crate::core_protocol::Connection;
use crate::core_session::Session;
use crate::core_transfer::TransferError;

/// Echoes the arguments back as one line. Any argument count is legal.
pub async fn handle_echo(conn: &mut Connection, session: &Session) -> Result<(), TransferError> {
    let msg = session.parser.args().join(" ").replace(['\r', '\n'], "");
    conn.send_line(&msg).await?;
    Ok(())
}

use crate::core_protocol::Connection;
use crate::core_session::Session;
use crate::core_transfer::TransferError;
use crate::helpers::format_uptime;

pub async fn handle_stime(conn: &mut Connection, session: &Session) -> Result<(), TransferError> {
    if !session.parser.check_args(0) {
        conn.send_line("Wrong arguments").await?;
        return Ok(());
    }
    conn.send_line(&format_uptime(session.uptime())).await?;
    Ok(())
}

use chrono::Local;

use crate::core_protocol::Connection;
use crate::core_session::Session;
use crate::core_transfer::TransferError;

pub async fn handle_time(conn: &mut Connection, session: &Session) -> Result<(), TransferError> {
    if !session.parser.check_args(0) {
        conn.send_line("Wrong arguments").await?;
        return Ok(());
    }
    let now = Local::now().format("%m/%d/%Y, %H:%M:%S").to_string();
    conn.send_line(&now).await?;
    Ok(())
}

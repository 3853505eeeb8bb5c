use crate::core_protocol::Connection;
use crate::core_session::Session;
use crate::core_transfer::TransferError;

const HELP_TEXT: &str = "\
echo - return argument.                Args: [string...]
time - server time.                    Args: no args
stime - server uptime.                 Args: no args
tree - show files.                     Args: no args
mkdir - create directory.              Args: [dir_path]
rm - remove directory/file.            Args: [path]
download - download file from server.  Args: [remote_path local_path]
upload - upload file to server.        Args: [remote_path local_path]
udpdownload - download file over UDP.  Args: [remote_path local_path]
udpupload - upload file over UDP.      Args: [remote_path local_path]
logout - disconnect from server.       Args: no args
shutdown - shutdown server.            Args: no args";

pub async fn handle_help(conn: &mut Connection, session: &Session) -> Result<(), TransferError> {
    if !session.parser.check_args(0) {
        conn.send_line("Wrong arguments").await?;
        return Ok(());
    }
    for line in HELP_TEXT.lines() {
        conn.send_line(line).await?;
    }
    Ok(())
}

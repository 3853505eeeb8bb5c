use std::path::Path;

use log::{error, info};
use tokio::fs;

use crate::config::Config;
use crate::core_protocol::Connection;
use crate::core_session::Session;
use crate::core_transfer::TransferError;
use crate::helpers::resolve_path;

pub async fn handle_rm(
    conn: &mut Connection,
    config: &Config,
    session: &Session,
) -> Result<(), TransferError> {
    if !session.parser.check_args(1) {
        conn.send_line("Wrong arguments").await?;
        return Ok(());
    }
    let arg = session.parser.arg(0).unwrap_or_default();
    let path = resolve_path(Path::new(&config.server.files_dir), arg);
    let removed = match fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir(&path).await,
        Ok(meta) if meta.is_file() => fs::remove_file(&path).await,
        Ok(_) => Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "not a file or directory",
        )),
        Err(e) => Err(e),
    };
    match removed {
        Ok(()) => {
            info!("Removed {}", path.display());
            conn.send_line("Directory/file removed successfully").await?;
        }
        Err(e) => {
            error!("Failed to remove {}: {}", path.display(), e);
            conn.send_line("Can't remove file/directory").await?;
        }
    }
    Ok(())
}

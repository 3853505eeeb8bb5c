use std::path::Path;

use log::{error, info};
use tokio::fs;

use crate::config::Config;
use crate::core_protocol::Connection;
use crate::core_session::Session;
use crate::core_transfer::TransferError;
use crate::helpers::resolve_path;

pub async fn handle_mkdir(
    conn: &mut Connection,
    config: &Config,
    session: &Session,
) -> Result<(), TransferError> {
    if !session.parser.check_args(1) {
        conn.send_line("Wrong arguments").await?;
        return Ok(());
    }
    let arg = session.parser.arg(0).unwrap_or_default();
    let dir_path = resolve_path(Path::new(&config.server.files_dir), arg);
    // create_dir, not create_dir_all: an existing path must be an error
    match fs::create_dir(&dir_path).await {
        Ok(()) => {
            info!("Directory created: {}", dir_path.display());
            conn.send_line("Directory created successfully").await?;
        }
        Err(e) => {
            error!("Failed to create directory {}: {}", dir_path.display(), e);
            conn.send_line("Can't create directory").await?;
        }
    }
    Ok(())
}

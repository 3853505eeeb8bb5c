use std::path::Path;

use log::error;

use crate::config::Config;
use crate::core_protocol::Connection;
use crate::core_session::Session;
use crate::core_transfer::TransferError;

pub async fn handle_tree(
    conn: &mut Connection,
    config: &Config,
    session: &Session,
) -> Result<(), TransferError> {
    if !session.parser.check_args(0) {
        conn.send_line("Wrong arguments").await?;
        return Ok(());
    }
    match render_tree(Path::new(&config.server.files_dir)) {
        Ok(listing) => {
            for line in listing.lines() {
                conn.send_line(line).await?;
            }
        }
        Err(e) => {
            error!("Failed to list files: {}", e);
            conn.send_line("Can't list files").await?;
        }
    }
    Ok(())
}

/// Renders the file root as an indented tree with box-drawing connectors.
pub fn render_tree(root: &Path) -> std::io::Result<String> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let mut out = format!("{}\n", name);
    walk(root, "", &mut out)?;
    Ok(out)
}

fn walk(dir: &Path, prefix: &str, out: &mut String) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    let count = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&entry.file_name().to_string_lossy());
        out.push('\n');
        if entry.file_type()?.is_dir() {
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            walk(&entry.path(), &child_prefix, out)?;
        }
    }
    Ok(())
}

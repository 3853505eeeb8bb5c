use std::net::SocketAddr;
use std::time::Instant;

use log::{error, info, warn};
use tokio::net::UdpSocket;

use crate::config::Config;
use crate::constants::{SYNC_RECV_TIMEOUT, SYNC_SEND_TIMEOUT};
use crate::core_command::command::Command;
use crate::core_command::{
    download, echo, help, logout, mkdir, rm, shutdown, stime, time, tree, udpdownload, udpupload,
    upload,
};
use crate::core_protocol::{Connection, ControlCode, Parser, ProtocolError};
use crate::core_transfer::TransferError;

/// Direction of the session's in-flight TCP transfer, viewed from the
/// client. Set when a transfer begins and cleared only on clean completion:
/// a session that still carries a direction after its connection dropped is
/// exactly what the resumption handshake looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferKind {
    #[default]
    None,
    Download,
    Upload,
}

/// Per-client logical state, keyed by the durable token and surviving
/// reconnects for as long as the server process runs.
pub struct Session {
    session_id: String,
    pub peer_address: Option<SocketAddr>,
    pub active: bool,
    pub shutdown_requested: bool,
    pub transfer: TransferKind,
    pub remote_path: Option<String>,
    pub local_path: Option<String>,
    pub parser: Parser,
    started_at: Instant,
}

impl Session {
    pub fn new(session_id: String, started_at: Instant) -> Self {
        info!("Starting session {}", session_id);
        Self {
            session_id,
            peer_address: None,
            active: true,
            shutdown_requested: false,
            transfer: TransferKind::None,
            remote_path: None,
            local_path: None,
            parser: Parser::new(),
            started_at,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Records the path arguments and direction of a transfer about to
    /// start. The raw arguments are kept as received; resume offsets are
    /// recomputed from on-disk file sizes, never tracked here.
    pub fn begin_transfer(&mut self, kind: TransferKind, remote: &str, local: &str) {
        self.transfer = kind;
        self.remote_path = Some(remote.to_string());
        self.local_path = Some(local.to_string());
    }

    pub fn finish_transfer(&mut self) {
        self.transfer = TransferKind::None;
    }

    /// The command loop: read one line, dispatch it, repeat until logout or
    /// a dropped connection.
    pub async fn poll(&mut self, conn: &mut Connection, config: &Config, udp: &UdpSocket) {
        loop {
            let line = match conn.read_line().await {
                Ok(line) => line,
                Err(ProtocolError::PeerClosed) => {
                    warn!("Client disconnected unexpectedly");
                    break;
                }
                Err(e) => {
                    error!("Receive failed: {}", e);
                    break;
                }
            };
            // a late envelope ack can arrive glued to the front of the next
            // command line; stray control bytes are not part of any verb
            let line = line.trim_start_matches(|c: char| c.is_control());
            if let Err(e) = self.dispatch(conn, config, udp, line).await {
                error!("Connection lost mid-command: {}", e);
                break;
            }
            if !self.active {
                info!("Client logged out");
                break;
            }
        }
    }

    /// Parses one line and runs its handler inside the command envelope.
    ///
    /// Handler failures are logged and the loop continues; only a dropped
    /// connection is returned upward. The envelope control bytes are all
    /// best-effort.
    async fn dispatch(
        &mut self,
        conn: &mut Connection,
        config: &Config,
        udp: &UdpSocket,
        line: &str,
    ) -> Result<(), TransferError> {
        self.parser.parse(line);
        let verb = self.parser.cmd().to_string();
        info!("Processing cmd {}", verb.to_uppercase());

        conn.send_control(ControlCode::CmdStart, SYNC_SEND_TIMEOUT).await;
        conn.recv_control(SYNC_RECV_TIMEOUT).await;

        let result = match Command::from_verb(&verb) {
            Some(Command::Echo) => echo::handle_echo(conn, self).await,
            Some(Command::Time) => time::handle_time(conn, self).await,
            Some(Command::Stime) => stime::handle_stime(conn, self).await,
            Some(Command::Help) => help::handle_help(conn, self).await,
            Some(Command::Tree) => tree::handle_tree(conn, config, self).await,
            Some(Command::Mkdir) => mkdir::handle_mkdir(conn, config, self).await,
            Some(Command::Rm) => rm::handle_rm(conn, config, self).await,
            Some(Command::Download) => download::handle_download(conn, config, self).await,
            Some(Command::Upload) => upload::handle_upload(conn, config, self).await,
            Some(Command::UdpDownload) => {
                udpdownload::handle_udpdownload(conn, config, self, udp).await
            }
            Some(Command::UdpUpload) => udpupload::handle_udpupload(conn, config, self, udp).await,
            Some(Command::Logout) => logout::handle_logout(conn, self).await,
            Some(Command::Shutdown) => shutdown::handle_shutdown(conn, self).await,
            None => conn
                .send_line("Bad request")
                .await
                .map_err(TransferError::from),
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_disconnect() => return Err(e),
            Err(e) => error!("Command {} failed: {}", verb, e),
        }

        conn.send_control(ControlCode::CmdEnd, SYNC_SEND_TIMEOUT).await;
        conn.recv_control(SYNC_RECV_TIMEOUT).await;
        Ok(())
    }
}

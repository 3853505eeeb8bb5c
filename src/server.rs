use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};

use crate::config::Config;
use crate::constants::{SYNC_RECV_TIMEOUT, SYNC_SEND_TIMEOUT};
use crate::core_protocol::{Connection, ControlCode, ProtocolError, ResumeInfo};
use crate::core_session::{SessionRegistry, TransferKind};
use crate::core_transfer::{tcp, TransferError};
use crate::helpers::resolve_path;

pub async fn run(config: Config) -> Result<()> {
    info!("INITIALIZING SERVER...");
    let server = Server::new(config);
    server.serve().await
}

/// Accepts one connection at a time and serves it to completion before
/// accepting the next. The registry survives across connections; that is the
/// whole point - it carries the in-flight transfer state a reconnecting
/// client resumes from.
pub struct Server {
    config: Arc<Config>,
    registry: SessionRegistry,
    started_at: Instant,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: SessionRegistry::new(),
            started_at: Instant::now(),
        }
    }

    pub async fn serve(mut self) -> Result<()> {
        let bind = self.config.server.clone();
        let listener = TcpListener::bind((bind.bind_address.as_str(), bind.port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", bind.bind_address, bind.port))?;
        let udp = UdpSocket::bind((bind.bind_address.as_str(), bind.udp_port))
            .await
            .with_context(|| format!("Failed to bind UDP port {}", bind.udp_port))?;
        info!(
            "Server listening on {}:{} (udp {})",
            bind.bind_address, bind.port, bind.udp_port
        );
        spawn_shutdown_prompt();

        loop {
            info!("LISTENING FOR CONNECTIONS...");
            let (socket, addr) = listener.accept().await?;
            info!("Accepted connection from {}", addr);
            let mut conn = match Connection::new(socket) {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Dropping connection from {}: {}", addr, e);
                    continue;
                }
            };

            let session_id = match self.restore(&mut conn).await {
                Ok(id) => id,
                Err(e) => {
                    warn!("Session handshake failed: {}", e);
                    continue;
                }
            };

            let config = Arc::clone(&self.config);
            let session = match self.registry.find(&session_id) {
                Some(session) => session,
                None => {
                    error!("Session {} vanished after handshake", session_id);
                    continue;
                }
            };
            session.peer_address = Some(addr);
            session.poll(&mut conn, &config, &udp).await;
            warn!(
                "Session ended: Active: {}, Shutdown: {}",
                session.active, session.shutdown_requested
            );
            let active = session.active;
            let shutdown = session.shutdown_requested;

            if shutdown {
                info!("Server performing shutdown...");
                return Ok(());
            }
            if !active {
                info!("Deleting session {}", session_id);
                self.registry.remove(&session_id);
                debug!("Remaining sessions: {:?}", self.registry.ids());
            }
        }
    }

    /// The resumption handshake, run once per accepted connection before the
    /// command loop starts.
    ///
    /// Step numbering follows the wire exchange:
    ///
    /// ```text
    /// 1  C -> S  session_id (text line)
    /// 2  S -> C  Ok   [unknown token: register fresh session, done]
    ///    S -> C  Err  [known token: resumption begins]
    /// 3  C -> S  Ok
    /// 4  S -> C  Ok   [no in-flight transfer: done]
    ///    S -> C  Err  [in-flight transfer: continue]
    /// 5  S -> C  resume info (JSON line)
    /// 6  C -> S  Ok
    /// 7  S -> C  Ok
    /// 8  C -> S  Ok
    /// 9  C -> S  size of the client's copy (decimal line)
    /// 10 S -> C  Ok, then both sides run the engine's resume variant
    /// ```
    ///
    /// Control-byte steps are best-effort; only the transfer engine itself
    /// enforces strict ordering.
    async fn restore(&mut self, conn: &mut Connection) -> Result<String, TransferError> {
        info!("Check if there is need to restore session");
        let session_id = conn.read_line().await?; // 1

        let snapshot = self
            .registry
            .find(&session_id)
            .map(|s| (s.transfer, s.remote_path.clone(), s.local_path.clone()));
        let Some((kind, remote, local)) = snapshot else {
            info!("No need to restore session");
            self.registry.create(session_id.clone(), self.started_at);
            conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await; // 2
            return Ok(session_id);
        };

        warn!("Previous session was unexpectedly disconnected. Trying to bring it back...");
        conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await; // 2
        conn.recv_control(SYNC_RECV_TIMEOUT).await; // 3

        let (remote, local) = match (kind, remote, local) {
            (TransferKind::None, _, _) | (_, None, _) | (_, _, None) => {
                info!("Previous session is restored");
                conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await; // 4
                return Ok(session_id);
            }
            (_, Some(remote), Some(local)) => (remote, local),
        };

        warn!("Previous session had some unfinished downloading/uploading. Restoring that...");
        conn.send_control(ControlCode::Err, SYNC_SEND_TIMEOUT).await; // 4

        let abs_path = resolve_path(Path::new(&self.config.server.files_dir), &remote);
        let server_size = match tokio::fs::metadata(&abs_path).await {
            Ok(meta) => meta.len(),
            // an upload may have died before the first byte hit the disk
            Err(_) if kind == TransferKind::Upload => 0,
            Err(e) => return Err(e.into()),
        };
        let resume = ResumeInfo {
            download: kind == TransferKind::Download,
            client_file_path: local.clone(),
            file_size: server_size,
        };
        conn.send_line(&resume.to_line()?).await?; // 5
        conn.recv_control(SYNC_RECV_TIMEOUT).await; // 6
        conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await; // 7
        conn.recv_control(SYNC_RECV_TIMEOUT).await; // 8
        let line = conn.read_line().await?; // 9
        let client_size: u64 = line
            .trim()
            .parse()
            .map_err(|_| ProtocolError::BadSize(line.clone()))?;
        conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await; // 10

        let chunk_size = self.config.transfer.chunk_size;
        let ack_every = self.config.transfer.ack_every();
        match kind {
            TransferKind::Download => {
                // the server holds the full source; the client reports how
                // much of it already arrived
                let done = client_size.min(server_size);
                tcp::resume_send(conn, &abs_path, server_size, done, chunk_size, ack_every)
                    .await?;
            }
            TransferKind::Upload => {
                // the server holds the partial target; the client reports
                // the full size of its source
                let total = client_size;
                let done = server_size.min(total);
                tcp::resume_recv(conn, &abs_path, total, done, chunk_size, ack_every).await?;
            }
            TransferKind::None => {}
        }

        if let Some(session) = self.registry.find(&session_id) {
            session.finish_transfer();
        }
        info!("Unfinished transfer restored");
        Ok(session_id)
    }
}

/// An operator interrupt asks for confirmation before an orderly shutdown.
fn spawn_shutdown_prompt() {
    tokio::spawn(async {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            print!("Do you really want to shutdown server? [Y/n] ");
            let _ = std::io::stdout().flush();
            let mut answer = String::new();
            let mut stdin = BufReader::new(tokio::io::stdin());
            if stdin.read_line(&mut answer).await.is_err() {
                continue;
            }
            if answer.trim().eq_ignore_ascii_case("y") {
                info!("Performing shutdown...");
                std::process::exit(0);
            }
        }
    });
}

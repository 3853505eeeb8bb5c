use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};

use crate::config::Config;
use crate::constants::{SYNC_RECV_TIMEOUT, SYNC_SEND_TIMEOUT};
use crate::core_protocol::{Connection, ControlCode, Parser, ResumeInfo};
use crate::core_token;
use crate::core_transfer::{tcp, udp, TransferError};
use crate::helpers::resolve_path;

pub async fn run(config: Config) -> Result<()> {
    let session_file = PathBuf::from(&config.client.session_file);
    let session_id = core_token::load_or_create(&session_file)
        .context("Failed to load or create the session token")?;
    info!("Session token: {}", session_id);

    println!("STARTING SESSION...");
    let stream = TcpStream::connect((
        config.client.server_address.as_str(),
        config.client.server_port,
    ))
    .await
    .with_context(|| {
        format!(
            "Failed to connect to {}:{}",
            config.client.server_address, config.client.server_port
        )
    })?;
    let conn = Connection::new(stream).context("Failed to set up the server connection")?;

    let mut client = Client {
        config,
        conn,
        session_id,
        session_file,
    };
    client
        .restore()
        .await
        .context("Session restore handshake failed")?;
    client.repl().await
}

/// The calling side: mirrors the resumption handshake and the per-command
/// protocol legs the server's handlers drive.
struct Client {
    config: Config,
    conn: Connection,
    session_id: String,
    session_file: PathBuf,
}

impl Client {
    /// Client half of the resumption handshake; step numbers as in
    /// `server::Server::restore`.
    async fn restore(&mut self) -> Result<(), TransferError> {
        self.conn.send_line(&self.session_id).await?; // 1
        match self.conn.recv_control(SYNC_RECV_TIMEOUT).await {
            ControlCode::Ok => {
                info!("Created new session");
                return Ok(());
            }
            ControlCode::Err => {}
            got => {
                warn!("Handshake answered {:?}, continuing without restore", got);
                return Ok(());
            }
        }

        info!("Restoring previous session");
        self.conn
            .send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT)
            .await; // 3
        match self.conn.recv_control(SYNC_RECV_TIMEOUT).await {
            ControlCode::Err => {}
            ControlCode::Ok => {
                info!("Restored session");
                return Ok(());
            }
            got => {
                warn!("Handshake answered {:?}, continuing without restore", got);
                return Ok(());
            }
        }

        let line = self.conn.read_line().await?; // 5
        let resume = ResumeInfo::from_line(&line)?;
        self.conn
            .send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT)
            .await; // 6
        self.conn.recv_control(SYNC_RECV_TIMEOUT).await; // 7
        self.conn
            .send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT)
            .await; // 8

        let local_path = resolve_path(
            Path::new(&self.config.client.files_dir),
            &resume.client_file_path,
        );
        println!(
            "Unfinished downloading/uploading: {}",
            local_path.display()
        );
        let local_size = tokio::fs::metadata(&local_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        self.conn.send_line(&local_size.to_string()).await?; // 9
        self.conn.recv_control(SYNC_RECV_TIMEOUT).await; // 10

        let chunk_size = self.config.transfer.chunk_size;
        let ack_every = self.config.transfer.ack_every();
        if resume.download {
            info!("Restoring download");
            let total = resume.file_size;
            let done = local_size.min(total);
            tcp::resume_recv(&mut self.conn, &local_path, total, done, chunk_size, ack_every)
                .await?;
        } else {
            info!("Restoring upload");
            let total = local_size;
            let done = resume.file_size.min(total);
            tcp::resume_send(&mut self.conn, &local_path, total, done, chunk_size, ack_every)
                .await?;
        }
        Ok(())
    }

    /// The interactive prompt loop. A failed operation prints its error and
    /// keeps the prompt; only a lost connection (or logout/shutdown) ends it.
    async fn repl(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        loop {
            print!(" > ");
            let _ = std::io::stdout().flush();
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if let Err(e) = self.process(&line).await {
                if e.is_disconnect() {
                    eprintln!("{}", "Connection to the server was lost".red());
                    return Err(e.into());
                }
                eprintln!("{}", e.to_string().red());
            }
            if line == "logout" || line == "shutdown" {
                self.forget_session();
                break;
            }
        }
        Ok(())
    }

    /// Sends one command line and runs the matching client leg inside the
    /// command envelope.
    async fn process(&mut self, line: &str) -> Result<(), TransferError> {
        self.conn.send_line(line).await?;
        if self.conn.recv_control(SYNC_RECV_TIMEOUT).await == ControlCode::CmdStart {
            self.conn
                .send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT)
                .await;
        }

        let mut parser = Parser::new();
        parser.parse(line);
        let result = match parser.cmd() {
            "download" => self.download(&parser).await,
            "upload" => self.upload(&parser).await,
            "udpdownload" => self.udp_download(&parser).await,
            "udpupload" => self.udp_upload(&parser).await,
            _ => self.print_reply().await,
        };

        if self.conn.recv_control(SYNC_RECV_TIMEOUT).await == ControlCode::CmdEnd {
            self.conn
                .send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT)
                .await;
        }
        result
    }

    /// Prints reply lines until the end-of-command sentinel shows up in the
    /// buffer. Replies are text; a control byte never starts a line, so one
    /// peeked byte is enough to tell them apart.
    async fn print_reply(&mut self) -> Result<(), TransferError> {
        loop {
            match self.conn.peek(SYNC_RECV_TIMEOUT).await {
                Some(byte) if byte == ControlCode::CmdEnd.as_byte() => break,
                None => break,
                Some(_) => println!("{}", self.conn.read_line().await?),
            }
        }
        Ok(())
    }

    async fn download(&mut self, parser: &Parser) -> Result<(), TransferError> {
        if self.conn.recv_control(SYNC_RECV_TIMEOUT).await != ControlCode::Ok {
            eprintln!("{}", "Can't download file: Wrong args".red());
            return Ok(());
        }
        if self.conn.recv_control(SYNC_RECV_TIMEOUT).await != ControlCode::Ok {
            eprintln!("{}", "Can't download file: Wrong paths".red());
            return Ok(());
        }
        let local = parser.arg(1).unwrap_or_default();
        let target = resolve_path(Path::new(&self.config.client.files_dir), local);
        let total = tcp::recv_file(
            &mut self.conn,
            &target,
            self.config.transfer.chunk_size,
            self.config.transfer.ack_every(),
        )
        .await?;
        println!("Downloaded {} bytes to {}", total, target.display());
        Ok(())
    }

    async fn upload(&mut self, parser: &Parser) -> Result<(), TransferError> {
        if self.conn.recv_control(SYNC_RECV_TIMEOUT).await != ControlCode::Ok {
            eprintln!("{}", "Can't upload file: Wrong args".red());
            return Ok(());
        }
        let local = parser.arg(1).unwrap_or_default();
        let source = resolve_path(Path::new(&self.config.client.files_dir), local);
        let is_file = tokio::fs::metadata(&source)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            eprintln!("{}", "Can't upload file: Wrong paths".red());
            self.conn
                .send_control(ControlCode::Err, SYNC_SEND_TIMEOUT)
                .await;
            return Ok(());
        }
        self.conn
            .send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT)
            .await;
        let total = tcp::send_file(
            &mut self.conn,
            &source,
            self.config.transfer.chunk_size,
            self.config.transfer.ack_every(),
        )
        .await?;
        println!("Uploaded {} bytes from {}", total, source.display());
        Ok(())
    }

    async fn udp_download(&mut self, parser: &Parser) -> Result<(), TransferError> {
        if self.conn.recv_control(SYNC_RECV_TIMEOUT).await != ControlCode::Ok {
            eprintln!("{}", "Can't download file: Wrong args".red());
            return Ok(());
        }
        if self.conn.recv_control(SYNC_RECV_TIMEOUT).await != ControlCode::Ok {
            eprintln!("{}", "Can't download file: Wrong paths".red());
            return Ok(());
        }
        let local = parser.arg(1).unwrap_or_default();
        let target = resolve_path(Path::new(&self.config.client.files_dir), local);
        let sock = UdpSocket::bind("0.0.0.0:0").await.map_err(TransferError::Io)?;
        let peer = udp::initiate_rendezvous(&sock, self.udp_server_addr().await?).await?;
        let total =
            udp::udp_recv_file(&sock, peer, &target, self.config.transfer.chunk_size).await?;
        println!("Downloaded {} bytes to {}", total, target.display());
        Ok(())
    }

    async fn udp_upload(&mut self, parser: &Parser) -> Result<(), TransferError> {
        if self.conn.recv_control(SYNC_RECV_TIMEOUT).await != ControlCode::Ok {
            eprintln!("{}", "Can't upload file: Wrong args".red());
            return Ok(());
        }
        let local = parser.arg(1).unwrap_or_default();
        let source = resolve_path(Path::new(&self.config.client.files_dir), local);
        let is_file = tokio::fs::metadata(&source)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            eprintln!("{}", "Can't upload file: Wrong paths".red());
            self.conn
                .send_control(ControlCode::Err, SYNC_SEND_TIMEOUT)
                .await;
            return Ok(());
        }
        self.conn
            .send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT)
            .await;
        let sock = UdpSocket::bind("0.0.0.0:0").await.map_err(TransferError::Io)?;
        let peer = udp::initiate_rendezvous(&sock, self.udp_server_addr().await?).await?;
        let total =
            udp::udp_send_file(&sock, peer, &source, self.config.transfer.chunk_size).await?;
        println!("Uploaded {} bytes from {}", total, source.display());
        Ok(())
    }

    async fn udp_server_addr(&self) -> Result<SocketAddr, TransferError> {
        let mut addrs = tokio::net::lookup_host((
            self.config.client.server_address.as_str(),
            self.config.client.udp_port,
        ))
        .await
        .map_err(TransferError::Io)?;
        addrs.next().ok_or_else(|| {
            TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "server address did not resolve",
            ))
        })
    }

    fn forget_session(&self) {
        if let Err(e) = core_token::clear(&self.session_file) {
            warn!("Failed to remove the session file: {}", e);
        }
    }
}

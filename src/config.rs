use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_PACKETS_PER_CHECK};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub udp_port: u16,
    pub files_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0"),
            port: 5051,
            udp_port: 5052,
            files_dir: String::from("files"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_address: String,
    pub server_port: u16,
    /// The server's UDP port, the target of the rendezvous datagram.
    pub udp_port: u16,
    pub files_dir: String,
    pub session_file: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: String::from("127.0.0.1"),
            server_port: 5051,
            udp_port: 5052,
            files_dir: String::from("files"),
            session_file: String::from(".ferryd-session"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    pub chunk_size: usize,
    pub packets_per_check: u64,
    pub enable_check: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            packets_per_check: DEFAULT_PACKETS_PER_CHECK,
            enable_check: true,
        }
    }
}

impl TransferConfig {
    /// Checkpoint cadence for the TCP engine; 0 disables pacing entirely.
    pub fn ack_every(&self) -> u64 {
        if self.enable_check {
            self.packets_per_check
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub transfer: TransferConfig,
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Config> {
        if !Path::new(path).exists() {
            warn!("Configuration file {} not found, using defaults", path);
            return Ok(Config::default());
        }
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;
        Ok(config)
    }
}

use clap::{Parser, Subcommand};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "ferryd",
    about = "A resumable file transfer server and client."
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ferryd.toml")]
    pub config: String,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Run the transfer server
    Server,
    /// Run the interactive client
    Client,
}

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

use ferryd::config::Config;
use ferryd::core_cli::{Cli, Mode};
use ferryd::{client, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration from the TOML file
    let config = Config::load_from_file(&args.config)?;

    match args.mode {
        Mode::Server => server::run(config).await,
        Mode::Client => client::run(config).await,
    }
}

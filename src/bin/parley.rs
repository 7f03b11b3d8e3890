//! parley - line client for the parley relay
//!
//! Copies stdin lines to the relay and relay lines to stdout. Closing
//! stdin sends `/quit`; the client exits once the relay closes the
//! connection.
//!
//! # Usage
//!
//! ```text
//! parley                       # connect to 127.0.0.1:7878
//! parley --addr chat.lan:7878  # connect elsewhere
//! PARLEY_ADDR=chat.lan:7878 parley
//! ```

use std::env;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use parley_protocol::command::QUIT;
use parleyd::config::DEFAULT_LISTEN_ADDR;

/// Environment variable naming the relay address.
const ADDR_ENV: &str = "PARLEY_ADDR";

/// parley - chat with other members of a parley relay
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
struct Args {
    /// Relay address (defaults to PARLEY_ADDR, then 127.0.0.1:7878)
    #[arg(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Only log when explicitly asked; stdout belongs to the chat
    if env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let addr = args
        .addr
        .or_else(|| env::var(ADDR_ENV).ok())
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("Failed to connect to {addr}"))?;
    debug!(addr = %addr, "Connected to relay");

    let (reader, mut writer) = stream.into_split();
    let mut relay_lines = BufReader::new(reader).lines();
    let mut stdin_lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = relay_lines.next_line() => {
                match line.context("Failed to read from relay")? {
                    Some(line) => {
                        stdout.write_all(line.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;
                    }
                    None => {
                        debug!("Relay closed the connection");
                        break;
                    }
                }
            }

            line = stdin_lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => send_line(&mut writer, &line).await?,
                    None => {
                        debug!("stdin closed, leaving chat");
                        stdin_open = false;
                        send_line(&mut writer, QUIT).await?;
                    }
                }
            }
        }
    }

    Ok(())
}

async fn send_line(writer: &mut OwnedWriteHalf, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await.context("Failed to send line to relay")
}

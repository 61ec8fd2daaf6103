//! Console front end: argument parsing, progress line, human-readable
//! sizes. All protocol work happens in `openshare-channel`.

use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use openshare_channel::{DEFAULT_PORT, FileReceiver, FileSender};
use openshare_transfer::TransferProgress;

#[derive(Parser)]
#[command(name = "openshare", about = "Send a single file over a direct TCP connection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for a receiver to connect, then send a file.
    Host {
        /// File to send.
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Connect to a host and receive the file it offers.
    Connect {
        /// IP address of the host.
        ip: IpAddr,
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Directory the received file is written into.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::Host { file, port } => host(file, port, cancel).await,
        Commands::Connect {
            ip,
            port,
            output_dir,
        } => connect(ip, port, output_dir, cancel).await,
    }
}

async fn host(file: PathBuf, port: u16, cancel: CancellationToken) -> anyhow::Result<()> {
    let sender = FileSender::new(cancel);
    let listener = sender
        .listen(port)
        .await
        .with_context(|| format!("failed to listen on port {port}"))?;
    println!("Waiting for a receiver on port {port}...");

    let sent = sender
        .accept_and_send(listener, &file, print_progress)
        .await
        .context("transfer failed")?;
    println!("\nSent {} ({})", file.display(), format_size(sent));
    Ok(())
}

async fn connect(
    ip: IpAddr,
    port: u16,
    output_dir: PathBuf,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = SocketAddr::new(ip, port);
    let receiver = FileReceiver::new(output_dir, cancel);
    let stream = receiver
        .connect(addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    println!("Connected to {addr}, waiting for the file...");

    let received = receiver
        .receive(stream, print_progress)
        .await
        .context("transfer failed")?;
    println!(
        "\nReceived {} ({})",
        received.path.display(),
        format_size(received.size_bytes)
    );
    Ok(())
}

/// Rewrites one console line per chunk.
fn print_progress(progress: TransferProgress) {
    print!("\rProgress: {:.2}%", progress.percent());
    let _ = std::io::stdout().flush();
}

/// `40000` -> `"39.1 KB"`.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(40_000), "39.1 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}

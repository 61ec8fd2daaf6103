//! Receiver role (connector side).
//!
//! Connects to the sender, waits for the `StartReceive` announcement,
//! writes exactly the announced number of bytes to a local file, and
//! acknowledges with a single `FileReceived` frame.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use openshare_protocol::{Command, FrameReader};
use openshare_transfer::{TransferProgress, TransferSession, copy_exact};

use crate::CONNECT_TIMEOUT;
use crate::error::ChannelError;

/// A completed receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    /// Where the file was written.
    pub path: PathBuf,
    /// Bytes written; always equals the announced size.
    pub size_bytes: u64,
}

/// Receiver role: owns the destination directory, serves exactly one
/// sender.
pub struct FileReceiver {
    output_dir: PathBuf,
    cancel: CancellationToken,
}

impl FileReceiver {
    pub fn new(output_dir: PathBuf, cancel: CancellationToken) -> Self {
        Self { output_dir, cancel }
    }

    /// Opens the outbound connection to the sender.
    pub async fn connect(&self, addr: SocketAddr) -> Result<TcpStream, ChannelError> {
        let stream = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(ChannelError::Cancelled);
            }
            result = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)) => {
                match result {
                    Ok(Ok(s)) => {
                        info!(%addr, "connected to sender");
                        s
                    }
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => return Err(ChannelError::Timeout),
                }
            }
        };
        Ok(stream)
    }

    /// Waits for the announcement, then receives the file into the output
    /// directory.
    ///
    /// An existing file under the announced name is truncated and
    /// overwritten. Frames other than `StartReceive` arriving before the
    /// announcement are ignored.
    pub async fn receive<F>(
        &self,
        stream: TcpStream,
        mut on_progress: F,
    ) -> Result<ReceivedFile, ChannelError>
    where
        F: FnMut(TransferProgress),
    {
        let (reader, mut writer) = stream.into_split();
        let mut frames = FrameReader::new(reader);

        let (file_name, file_size) = loop {
            let command = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(ChannelError::Cancelled);
                }
                result = frames.next_command() => result?,
            };
            match command {
                Some(Command::StartReceive {
                    file_name,
                    file_size,
                }) => break (file_name, file_size),
                Some(cmd) => {
                    debug!(?cmd, "ignoring frame while awaiting announcement");
                }
                None => return Err(ChannelError::ConnectionClosed),
            }
        };

        validate_file_name(&file_name)?;
        let dest = self.output_dir.join(&file_name);
        info!(file = %file_name, size = file_size, dest = %dest.display(), "incoming transfer");

        let mut file = File::create(&dest).await?;
        let mut session = TransferSession::new(&file_name, file_size);
        copy_exact(
            &mut frames,
            &mut file,
            &mut session,
            &self.cancel,
            &mut on_progress,
        )
        .await?;
        file.flush().await?;

        writer.write_all(&Command::FileReceived.encode()).await?;
        writer.flush().await?;
        info!(size = file_size, "transfer complete, acknowledgment sent");

        Ok(ReceivedFile {
            path: dest,
            size_bytes: file_size,
        })
    }
}

/// The announced name must be a bare file name: a single path component,
/// no traversal, nothing absolute.
fn validate_file_name(name: &str) -> Result<(), ChannelError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(ChannelError::InvalidFileName(name.to_string()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ChannelError::InvalidFileName(name.to_string()));
    }
    // Windows drive prefix.
    if name.len() >= 2 && name.as_bytes()[1] == b':' {
        return Err(ChannelError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

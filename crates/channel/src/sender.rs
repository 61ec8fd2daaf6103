//! Sender role (listener side).
//!
//! Binds a port, accepts a single inbound connection, announces the file
//! with `StartReceive`, streams the raw bytes, and waits for the peer's
//! `FileReceived` acknowledgment. The wait is bounded: a hung or
//! disconnected peer fails the transfer instead of blocking forever.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use openshare_protocol::{Command, FrameReader};
use openshare_transfer::{CHUNK_SIZE, TransferProgress, TransferSession, copy_exact};

use crate::error::ChannelError;
use crate::{ACK_TIMEOUT, CONNECT_TIMEOUT};

/// Sender role: owns the source file, serves exactly one receiver.
pub struct FileSender {
    cancel: CancellationToken,
}

impl FileSender {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Binds the listening socket.
    ///
    /// Kept separate from [`accept_and_send`](Self::accept_and_send) so the
    /// caller can learn the bound address before the blocking accept.
    pub async fn listen(&self, port: u16) -> Result<TcpListener, ChannelError> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        info!(port = listener.local_addr()?.port(), "waiting for a receiver");
        Ok(listener)
    }

    /// Accepts one connection and sends the file at `path` over it.
    ///
    /// The file is announced under its base name. Returns the number of
    /// bytes sent once the receiver has acknowledged the transfer.
    pub async fn accept_and_send<F>(
        &self,
        listener: TcpListener,
        path: &Path,
        mut on_progress: F,
    ) -> Result<u64, ChannelError>
    where
        F: FnMut(TransferProgress),
    {
        let stream = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(ChannelError::Cancelled);
            }
            result = tokio::time::timeout(CONNECT_TIMEOUT, listener.accept()) => {
                match result {
                    Ok(Ok((stream, addr))) => {
                        info!(%addr, "receiver connected");
                        stream
                    }
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => return Err(ChannelError::Timeout),
                }
            }
        };

        // One connection per transfer.
        drop(listener);

        let file_name = file_name_for_wire(path)?;
        let mut file = File::open(path).await?;
        let file_size = file.metadata().await?.len();

        let (reader, writer) = stream.into_split();
        let mut frames = FrameReader::new(reader);
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, writer);

        let announce = Command::StartReceive {
            file_name: file_name.clone(),
            file_size,
        };
        writer.write_all(&announce.encode()).await?;
        writer.flush().await?;
        info!(file = %file_name, size = file_size, "transfer announced");

        let mut session = TransferSession::new(file_name, file_size);
        copy_exact(
            &mut file,
            &mut writer,
            &mut session,
            &self.cancel,
            &mut on_progress,
        )
        .await?;
        writer.flush().await?;
        debug!(bytes = session.transferred_bytes(), "file streamed");

        // Await the acknowledgment, bounded.
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(ChannelError::Cancelled);
            }
            result = tokio::time::timeout(ACK_TIMEOUT, wait_for_ack(&mut frames)) => {
                match result {
                    Ok(ack) => ack?,
                    Err(_) => return Err(ChannelError::Timeout),
                }
            }
        }

        info!(size = file_size, "transfer acknowledged");
        Ok(file_size)
    }
}

/// Reads frames until `FileReceived` arrives. Anything else is ignored.
async fn wait_for_ack<R>(frames: &mut FrameReader<R>) -> Result<(), ChannelError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    loop {
        match frames.next_command().await? {
            Some(Command::FileReceived) => return Ok(()),
            Some(cmd) => {
                debug!(?cmd, "ignoring frame while awaiting acknowledgment");
            }
            None => return Err(ChannelError::ConnectionClosed),
        }
    }
}

/// Base name of `path`, checked against the characters the frame syntax
/// reserves.
fn file_name_for_wire(path: &Path) -> Result<String, ChannelError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ChannelError::InvalidFileName(path.display().to_string()))?;
    if name.contains(['*', '?', '\n']) {
        return Err(ChannelError::InvalidFileName(name.to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn spawn_sender(
        data: &[u8],
    ) -> (
        std::net::SocketAddr,
        tokio::task::JoinHandle<Result<u64, ChannelError>>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::write(&path, data).unwrap();

        let sender = FileSender::new(CancellationToken::new());
        let listener = sender.listen(0).await.unwrap();
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port())
            .parse()
            .unwrap();

        let handle = tokio::spawn(async move {
            sender
                .accept_and_send(listener, &path, |_| {})
                .await
        });
        (addr, handle, dir)
    }

    /// Drains the announcement frame and payload from a raw peer's stream.
    async fn read_announced_payload(
        stream: &mut TcpStream,
        expected_frame: &[u8],
        payload_len: usize,
    ) -> Vec<u8> {
        let mut frame = vec![0u8; expected_frame.len()];
        stream.read_exact(&mut frame).await.unwrap();
        assert_eq!(frame, expected_frame);

        let mut payload = vec![0u8; payload_len];
        stream.read_exact(&mut payload).await.unwrap();
        payload
    }

    #[tokio::test]
    async fn sender_streams_announcement_then_payload() {
        let data = b"hello over the wire";
        let (addr, handle, _dir) = spawn_sender(data).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let payload =
            read_announced_payload(&mut stream, b"StartReceive*payload.bin?19\n", 19).await;
        assert_eq!(payload, data);

        stream.write_all(b"FileReceived\n").await.unwrap();
        assert_eq!(handle.await.unwrap().unwrap(), 19);
    }

    #[tokio::test]
    async fn sender_ignores_unknown_frames_before_ack() {
        let data = b"abcd";
        let (addr, handle, _dir) = spawn_sender(data).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        read_announced_payload(&mut stream, b"StartReceive*payload.bin?4\n", 4).await;

        // Unknown frames must be skipped, then the ack lands. The original
        // peer spells the ack with a trailing separator.
        stream
            .write_all(b"Ping\nStats*1?2\nFileReceived*\n")
            .await
            .unwrap();
        assert_eq!(handle.await.unwrap().unwrap(), 4);
    }

    #[tokio::test]
    async fn sender_fails_when_peer_closes_without_ack() {
        let data = b"abcd";
        let (addr, handle, _dir) = spawn_sender(data).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        read_announced_payload(&mut stream, b"StartReceive*payload.bin?4\n", 4).await;
        drop(stream);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, ChannelError::ConnectionClosed));
    }

    #[tokio::test]
    async fn sender_cancellation_before_accept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"x").unwrap();

        let cancel = CancellationToken::new();
        let sender = FileSender::new(cancel.clone());
        let listener = sender.listen(0).await.unwrap();

        cancel.cancel();
        let result = sender.accept_and_send(listener, &path, |_| {}).await;
        assert!(matches!(result, Err(ChannelError::Cancelled)));
    }

    #[test]
    fn wire_file_name_rejects_reserved_characters() {
        assert!(file_name_for_wire(&PathBuf::from("dir/what?.bin")).is_err());
        assert!(file_name_for_wire(&PathBuf::from("star*.bin")).is_err());
        assert_eq!(
            file_name_for_wire(&PathBuf::from("/tmp/report.txt")).unwrap(),
            "report.txt"
        );
    }
}

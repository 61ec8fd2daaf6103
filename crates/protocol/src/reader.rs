//! Buffered frame assembly over a byte stream.
//!
//! A TCP read may return a partial frame, several frames back to back, or a
//! frame followed by the start of the raw payload. [`FrameReader`] buffers
//! incoming bytes and scans for the delimiter, so frame boundaries never
//! depend on read-call boundaries. Bytes buffered past a frame are served
//! back through the reader's own [`AsyncRead`] impl, which drains the
//! internal buffer before touching the underlying stream.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::command::{Command, ProtocolError};
use crate::{FRAME_DELIMITER, MAX_FRAME_LEN};

/// Assembles delimiter-terminated command frames from an [`AsyncRead`].
pub struct FrameReader<R> {
    inner: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// Reads until one full frame is buffered, then decodes it.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between frames. EOF
    /// with a partial frame buffered is a [`ProtocolError::TruncatedFrame`].
    pub async fn next_command(&mut self) -> Result<Option<Command>, ProtocolError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == FRAME_DELIMITER) {
                let frame = self.buffer.split_to(pos + 1);
                return Command::decode(&frame[..frame.len() - 1]).map(Some);
            }

            if self.buffer.len() >= MAX_FRAME_LEN {
                return Err(ProtocolError::FrameTooLong { max: MAX_FRAME_LEN });
            }

            let n = self.inner.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(ProtocolError::TruncatedFrame {
                        buffered: self.buffer.len(),
                    })
                };
            }
        }
    }

    /// Bytes currently buffered ahead of the underlying stream.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Raw payload reads drain the frame buffer first, so bytes that arrived in
/// the same segment as an announcement frame are not lost.
impl<R: AsyncRead + Unpin> AsyncRead for FrameReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.buffer.is_empty() {
            let n = this.buffer.len().min(buf.remaining());
            buf.put_slice(&this.buffer[..n]);
            this.buffer.advance(n);
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

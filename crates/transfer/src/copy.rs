//! The shared chunked copy loop.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::{CHUNK_SIZE, TransferError, TransferProgress, TransferSession};

/// Moves exactly `session.total_bytes()` bytes from `reader` to `writer`.
///
/// Each iteration requests `min(CHUNK_SIZE, remaining)` bytes, forwards
/// however many actually arrived, and invokes `on_progress` — including
/// after the final partial chunk. A zero-byte transfer performs no
/// iterations and emits a single 100% report.
///
/// A read of 0 bytes before the total is reached means the peer closed the
/// connection prematurely; that is a fatal [`TransferError::UnexpectedEof`],
/// never a successful completion. On any error the session is marked
/// failed before the error is returned.
pub async fn copy_exact<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    session: &mut TransferSession,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnMut(TransferProgress),
{
    session.start();

    if session.total_bytes() == 0 {
        session.complete();
        on_progress(session.progress());
        return Ok(0);
    }

    let mut buf = vec![0u8; CHUNK_SIZE];
    while session.remaining_bytes() > 0 {
        if cancel.is_cancelled() {
            session.fail();
            return Err(TransferError::Cancelled);
        }

        let want = (session.remaining_bytes() as usize).min(CHUNK_SIZE);
        let n = match reader.read(&mut buf[..want]).await {
            Ok(n) => n,
            Err(e) => {
                session.fail();
                return Err(e.into());
            }
        };
        if n == 0 {
            let received = session.transferred_bytes();
            let expected = session.total_bytes();
            session.fail();
            return Err(TransferError::UnexpectedEof { expected, received });
        }

        if let Err(e) = writer.write_all(&buf[..n]).await {
            session.fail();
            return Err(e.into());
        }

        session.add_progress(n as u64);
        on_progress(session.progress());
    }

    session.complete();
    Ok(session.transferred_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run_copy(
        data: &[u8],
        total: u64,
    ) -> (Result<u64, TransferError>, Vec<u8>, Vec<TransferProgress>) {
        let mut reader = data;
        let mut sink = Vec::new();
        let mut session = TransferSession::new("test.bin", total);
        let mut reports = Vec::new();
        let result = copy_exact(
            &mut reader,
            &mut sink,
            &mut session,
            &CancellationToken::new(),
            |p| reports.push(p),
        )
        .await;
        (result, sink, reports)
    }

    #[tokio::test]
    async fn roundtrip_small() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let (result, sink, reports) = run_copy(data, data.len() as u64).await;
        assert_eq!(result.unwrap(), data.len() as u64);
        assert_eq!(sink, data);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].percent(), 100.0);
    }

    #[tokio::test]
    async fn chunk_count_matches_ceiling() {
        // 40000 bytes move in exactly three chunks: 16384, 16384, 7232.
        let data = vec![0xA5u8; 40_000];
        let (result, sink, reports) = run_copy(&data, 40_000).await;
        assert_eq!(result.unwrap(), 40_000);
        assert_eq!(sink, data);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].transferred_bytes, 16_384);
        assert_eq!(reports[1].transferred_bytes, 32_768);
        assert_eq!(reports[2].transferred_bytes, 40_000);
        assert_eq!(reports[2].percent(), 100.0);
    }

    #[tokio::test]
    async fn progress_is_monotonic() {
        let data = vec![7u8; 100_000];
        let (result, _, reports) = run_copy(&data, 100_000).await;
        result.unwrap();
        assert!(
            reports
                .windows(2)
                .all(|w| w[0].transferred_bytes < w[1].transferred_bytes)
        );
        assert_eq!(reports.last().unwrap().transferred_bytes, 100_000);
    }

    #[tokio::test]
    async fn zero_byte_transfer() {
        let (result, sink, reports) = run_copy(b"", 0).await;
        assert_eq!(result.unwrap(), 0);
        assert!(sink.is_empty());
        // No chunk iterations, one immediate completion report.
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].percent(), 100.0);
    }

    #[tokio::test]
    async fn premature_eof_is_fatal() {
        // Source holds 10 bytes but 100 were announced.
        let data = vec![1u8; 10];
        let mut reader = &data[..];
        let mut sink = Vec::new();
        let mut session = TransferSession::new("short.bin", 100);
        let result = copy_exact(
            &mut reader,
            &mut sink,
            &mut session,
            &CancellationToken::new(),
            |_| {},
        )
        .await;

        assert!(matches!(
            result,
            Err(TransferError::UnexpectedEof {
                expected: 100,
                received: 10,
            })
        ));
        assert_eq!(session.status(), crate::TransferStatus::Failed);
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let data = vec![0u8; 1024];
        let mut reader = &data[..];
        let mut sink = Vec::new();
        let mut session = TransferSession::new("c.bin", 1024);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = copy_exact(&mut reader, &mut sink, &mut session, &cancel, |_| {}).await;
        assert!(matches!(result, Err(TransferError::Cancelled)));
        assert_eq!(session.status(), crate::TransferStatus::Failed);
    }
}

//! Chunked file transfer: the shared copy loop, per-transfer session
//! state, and progress reporting.
//!
//! Both roles run the same loop — the sender reads from a file and writes
//! to the connection, the receiver reads from the connection and writes to
//! a file. The loop moves at most [`CHUNK_SIZE`] bytes per iteration and
//! never assumes a read returns the full requested amount.

mod copy;
mod progress;
mod session;

pub use copy::copy_exact;
pub use progress::TransferProgress;
pub use session::{TransferSession, TransferStatus};

/// Chunk size and socket read buffer size: 16 KiB.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Errors produced by the transfer loop.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream closed after {received} of {expected} bytes")]
    UnexpectedEof { expected: u64, received: u64 },

    #[error("cancelled")]
    Cancelled,
}

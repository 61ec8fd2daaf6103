//! Error types for the transfer channel.

use openshare_protocol::ProtocolError;
use openshare_transfer::TransferError;

/// Errors produced by the sender and receiver roles.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("peer closed the connection")]
    ConnectionClosed,

    #[error("timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,
}

//! TCP roles for single-file transfers.
//!
//! One transfer involves exactly two endpoints on one connection: the
//! [`FileSender`] binds a listener, accepts a single inbound connection,
//! and streams the file; the [`FileReceiver`] connects out, waits for the
//! announcement, and writes the file to disk. The wire format lives in
//! `openshare-protocol`, the chunk loop in `openshare-transfer`.

pub mod error;
pub mod receiver;
pub mod sender;

pub use error::ChannelError;
pub use receiver::{FileReceiver, ReceivedFile};
pub use sender::FileSender;

use std::time::Duration;

/// Default port for transfers.
pub const DEFAULT_PORT: u16 = 5402;

/// Timeout for the connection attempt, and for the sender's wait for an
/// inbound connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the sender's wait for the `FileReceived` acknowledgment.
pub const ACK_TIMEOUT: Duration = Duration::from_secs(30);

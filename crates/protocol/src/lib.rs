//! Wire protocol for single-file transfers.
//!
//! Control commands and raw file bytes share one TCP stream. Commands are
//! delimiter-terminated text frames; file bytes follow a `StartReceive`
//! announcement with no framing of their own — their boundary is the byte
//! count carried by the announcement.
//!
//! # Wire format
//!
//! ```text
//! FRAME:        <name> '\n'
//!          or   <name> '*' <field1> '?' <field2> ... '\n'
//!
//! ANNOUNCEMENT: StartReceive*<fileName>?<fileSizeBytes>\n
//!               [fileSizeBytes bytes: raw file data]
//! ACK:          FileReceived\n
//! ```

pub mod command;
pub mod reader;

pub use command::{Command, ProtocolError};
pub use reader::FrameReader;

/// Byte that terminates every command frame.
pub const FRAME_DELIMITER: u8 = b'\n';

/// Separates the command name from its argument block.
pub const COMMAND_SEPARATOR: char = '*';

/// Separates arguments within the argument block.
pub const FIELD_SEPARATOR: char = '?';

/// Upper bound on a single command frame, delimiter included.
///
/// A frame carries a command name, a file name, and a decimal byte count;
/// anything larger than this is a misbehaving peer, not a real frame.
pub const MAX_FRAME_LEN: usize = 1024;

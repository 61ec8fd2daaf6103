//! Command frames and their wire encoding.

use crate::{COMMAND_SEPARATOR, FIELD_SEPARATOR, FRAME_DELIMITER};

/// Errors produced while decoding a command frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("`{command}` frame is missing the `{field}` field")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },

    #[error("invalid file size `{value}`")]
    InvalidFileSize { value: String },

    #[error("frame exceeds {max} bytes without a delimiter")]
    FrameTooLong { max: usize },

    #[error("stream closed mid-frame ({buffered} bytes buffered)")]
    TruncatedFrame { buffered: usize },
}

/// A decoded command frame.
///
/// Unrecognized command names decode to [`Command::Unknown`] so that both
/// roles can skip frames they do not understand instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Announces an incoming file: exactly `file_size` raw bytes follow
    /// this frame on the stream.
    StartReceive { file_name: String, file_size: u64 },
    /// Acknowledges full receipt of the announced file.
    FileReceived,
    /// Any command name this implementation does not recognize.
    Unknown { name: String },
}

impl Command {
    /// Encodes the command as a full frame, trailing delimiter included.
    ///
    /// No escaping is performed: field values must not contain `*`, `?`,
    /// or the delimiter byte. That is a constraint of the wire format, not
    /// something this encoder validates.
    pub fn encode(&self) -> Vec<u8> {
        let mut text = match self {
            Command::StartReceive {
                file_name,
                file_size,
            } => format!(
                "StartReceive{COMMAND_SEPARATOR}{file_name}{FIELD_SEPARATOR}{file_size}"
            ),
            Command::FileReceived => "FileReceived".to_string(),
            Command::Unknown { name } => name.clone(),
        };
        text.push(FRAME_DELIMITER as char);
        text.into_bytes()
    }

    /// Decodes one frame, given without its trailing delimiter.
    ///
    /// Splits on `*` to separate the command name from the argument block,
    /// then on `?` within the block. A missing or unparseable
    /// `fileSizeBytes` is an error; a `StartReceive` with a garbage size
    /// must never start a session.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(frame)?;
        let (name, fields): (&str, Vec<&str>) = match text.split_once(COMMAND_SEPARATOR) {
            Some((name, block)) => (name, block.split(FIELD_SEPARATOR).collect()),
            None => (text, Vec::new()),
        };

        match name {
            "StartReceive" => {
                let file_name =
                    fields
                        .first()
                        .filter(|f| !f.is_empty())
                        .ok_or(ProtocolError::MissingField {
                            command: "StartReceive",
                            field: "fileName",
                        })?;
                let size_field = fields.get(1).ok_or(ProtocolError::MissingField {
                    command: "StartReceive",
                    field: "fileSizeBytes",
                })?;
                let file_size =
                    size_field
                        .parse::<u64>()
                        .map_err(|_| ProtocolError::InvalidFileSize {
                            value: size_field.to_string(),
                        })?;
                Ok(Command::StartReceive {
                    file_name: file_name.to_string(),
                    file_size,
                })
            }
            // The original peer sends this as `FileReceived*` (trailing
            // separator, empty argument block); accept both spellings.
            "FileReceived" => Ok(Command::FileReceived),
            other => Ok(Command::Unknown {
                name: other.to_string(),
            }),
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of message")]
    UnexpectedEof,

    #[error("DATA length {0} exceeds the maximum decoded length (2^31 - 8)")]
    LengthTooLarge(u32),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown message type tag: {0:#04x}")]
    UnknownType(u8),

    #[error("unknown protocol version: {0}")]
    UnknownVersion(u16),

    #[error("trailing bytes after decoding a complete structure")]
    TrailingBytes,
}

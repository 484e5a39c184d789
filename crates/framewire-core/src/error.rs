use std::{fmt, io};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Enumerated error kinds surfaced by the transport.
///
/// Conditions that are counted and dropped internally (checksum
/// mismatches, invalid headers, duplicate fragments) never reach the
/// embedder as errors; they show up in statistics instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A parameter failed validation.
    InvalidParam,
    /// An allocation could not be satisfied.
    NoMemory,
    /// An operation did not complete within its deadline.
    Timeout,
    /// Non-blocking I/O would have blocked; the caller may retry.
    Busy,
    /// A packet failed CRC verification.
    Checksum,
    /// A packet header failed validation.
    PacketInvalid,
    /// A payload exceeds the wire or buffer limit for its class.
    PacketTooLarge,
    /// A frame is malformed for the requested operation.
    FrameInvalid,
    /// A frame is missing fragments.
    FrameIncomplete,
    /// A peer address could not be parsed or resolved.
    AddrInvalid,
    /// The UDP socket could not be created.
    SocketCreate,
    /// The UDP socket could not be bound.
    SocketBind,
    /// A datagram could not be sent.
    SocketSend,
    /// A datagram could not be received.
    SocketRecv,
    /// The operation requires an established connection.
    NotReady,
    /// The endpoint was already initialized.
    AlreadyInit,
    /// The connection has been torn down.
    Disconnected,
    /// A write would exceed the frame's capacity.
    Overflow,
}

impl ErrorKind {
    /// Maps an I/O error from a send call onto the transport taxonomy.
    pub fn from_send(err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::WouldBlock {
            ErrorKind::Busy
        } else {
            ErrorKind::SocketSend
        }
    }

    /// Maps an I/O error from a receive call onto the transport taxonomy.
    pub fn from_recv(err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::WouldBlock {
            ErrorKind::Busy
        } else {
            ErrorKind::SocketRecv
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ErrorKind::InvalidParam => "invalid parameter",
            ErrorKind::NoMemory => "out of memory",
            ErrorKind::Timeout => "operation timed out",
            ErrorKind::Busy => "operation would block",
            ErrorKind::Checksum => "checksum mismatch",
            ErrorKind::PacketInvalid => "invalid packet header",
            ErrorKind::PacketTooLarge => "packet too large",
            ErrorKind::FrameInvalid => "invalid frame",
            ErrorKind::FrameIncomplete => "frame incomplete",
            ErrorKind::AddrInvalid => "invalid address",
            ErrorKind::SocketCreate => "socket creation failed",
            ErrorKind::SocketBind => "socket bind failed",
            ErrorKind::SocketSend => "socket send failed",
            ErrorKind::SocketRecv => "socket receive failed",
            ErrorKind::NotReady => "endpoint not connected",
            ErrorKind::AlreadyInit => "already initialized",
            ErrorKind::Disconnected => "connection closed",
            ErrorKind::Overflow => "write exceeds frame capacity",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ErrorKind {}

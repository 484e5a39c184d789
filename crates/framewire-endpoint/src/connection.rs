use std::time::Instant;

/// Connection lifecycle state machine.
///
/// The receiver initiates with CONNECT, the sender replies CONNECTED,
/// and the receiver's ACK completes the three-way handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection; both sides start here.
    #[default]
    Idle,
    /// Receiver only: CONNECT sent, waiting for CONNECTED.
    HandshakeSent,
    /// Sender only: CONNECTED sent, waiting for the closing ACK.
    ReplyPending,
    /// Handshake complete on this side.
    Connected,
    /// Locally closed; no further traffic expected.
    Closed,
}

impl ConnectionState {
    /// Returns true once the handshake has completed on this side.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Returns true while the handshake is in flight.
    pub fn is_handshaking(&self) -> bool {
        matches!(self, ConnectionState::HandshakeSent | ConnectionState::ReplyPending)
    }

    /// Returns true after a local close.
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

/// Retransmission bookkeeping for the in-flight handshake packet.
#[derive(Debug, Default)]
pub(crate) struct Handshake {
    pub send_time: Option<Instant>,
    pub retrans_count: u8,
}

impl Handshake {
    pub fn arm(&mut self, now: Instant) {
        self.send_time = Some(now);
        self.retrans_count = 0;
    }

    pub fn reset(&mut self) {
        self.send_time = None;
        self.retrans_count = 0;
    }
}

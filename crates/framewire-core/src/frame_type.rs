use std::convert::TryFrom;

use crate::error::ErrorKind;

/// Frame type carried in every packet header.
///
/// Media types identify codec output classes; control types carry the
/// connection lifecycle, acknowledgments, and reliable user datagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Keyframe; protected by per-fragment retransmission.
    I = 1,
    /// Predicted frame; dropped on loss.
    P = 2,
    /// Sequence parameter set.
    Sps = 3,
    /// Picture parameter set.
    Pps = 4,
    /// Audio frame; dropped on loss.
    Audio = 5,
    /// Connection request (receiver -> sender).
    Connect = 0x10,
    /// Connection accept (sender -> receiver).
    Connected = 0x11,
    /// Graceful teardown.
    Disconnect = 0x12,
    /// Acknowledgment.
    Ack = 0x13,
    /// Liveness heartbeat (receiver -> sender).
    Heartbeat = 0x14,
    /// Reliable user datagram.
    User = 0x15,
    /// Start media transmission, optionally carrying a URL.
    Start = 0x16,
    /// Stop media transmission.
    Stop = 0x17,
}

impl FrameType {
    /// Returns true for the media classes (I/P/SPS/PPS/A).
    pub fn is_media(self) -> bool {
        matches!(
            self,
            FrameType::I | FrameType::P | FrameType::Sps | FrameType::Pps | FrameType::Audio
        )
    }

    /// Returns true for the control range (0x10..=0x17).
    pub fn is_control(self) -> bool {
        !self.is_media()
    }

    /// Returns true when the receiver must acknowledge each fragment of
    /// this type individually so the sender can retransmit selectively.
    pub fn needs_fragment_ack(self) -> bool {
        self == FrameType::I
    }

    /// The wire representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FrameType {
    type Error = ErrorKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FrameType::I),
            2 => Ok(FrameType::P),
            3 => Ok(FrameType::Sps),
            4 => Ok(FrameType::Pps),
            5 => Ok(FrameType::Audio),
            0x10 => Ok(FrameType::Connect),
            0x11 => Ok(FrameType::Connected),
            0x12 => Ok(FrameType::Disconnect),
            0x13 => Ok(FrameType::Ack),
            0x14 => Ok(FrameType::Heartbeat),
            0x15 => Ok(FrameType::User),
            0x16 => Ok(FrameType::Start),
            0x17 => Ok(FrameType::Stop),
            _ => Err(ErrorKind::PacketInvalid),
        }
    }
}

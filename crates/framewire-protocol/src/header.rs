//! The fixed-layout packet header and its codec.
//!
//! Wire layout, big-endian:
//!
//! | offset | width | field |
//! |---|---|---|
//! | 0  | 4 | seq_num |
//! | 4  | 2 | frame_id |
//! | 6  | 1 | frame_type |
//! | 7  | 1 | flags |
//! | 8  | 2 | frag_index |
//! | 10 | 2 | total_frags |
//! | 12 | 2 | payload_size |
//! | 14 | 2 | checksum |
//!
//! The checksum is a trailer over the 14 header-field bytes plus the
//! payload; fragmentation budgets count the 14 field bytes against the
//! MTU.

use std::{convert::TryFrom, io::Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use framewire_core::{
    error::{ErrorKind, Result},
    frame_type::FrameType,
};

/// Serialized size of the header fields, excluding the checksum.
pub const HEADER_SIZE: usize = 14;
/// Size of the trailing CRC-16 checksum.
pub const CHECKSUM_SIZE: usize = 2;
/// Total bytes preceding the payload in every packet.
pub const PACKET_OVERHEAD: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Flag bit: this packet carries the last fragment of its frame.
pub const FLAG_LAST_FRAG: u8 = 1 << 0;
/// Flag bit: this packet is a retransmission.
pub const FLAG_RETRANS: u8 = 1 << 1;

/// Packet header, host representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Monotonically increasing per-endpoint packet counter.
    pub seq_num: u32,
    /// Logical frame the packet belongs to.
    pub frame_id: u16,
    /// Media or control class.
    pub frame_type: FrameType,
    /// Flag bits ([`FLAG_LAST_FRAG`], [`FLAG_RETRANS`]).
    pub flags: u8,
    /// 0-based fragment index within the frame.
    pub frag_index: u16,
    /// Fragment count of the frame; control frames use 1.
    pub total_frags: u16,
    /// Payload bytes following the header.
    pub payload_size: u16,
    /// CRC-16/CCITT over the header fields and payload.
    pub checksum: u16,
}

impl PacketHeader {
    /// Builds a header for a single-packet control frame.
    pub fn control(frame_type: FrameType, seq_num: u32, frame_id: u16) -> Self {
        Self {
            seq_num,
            frame_id,
            frame_type,
            flags: 0,
            frag_index: 0,
            total_frags: 1,
            payload_size: 0,
            checksum: 0,
        }
    }

    /// Serializes the header big-endian, checksum field included.
    ///
    /// Callers building a packet zero the checksum first and patch it
    /// via [`crate::checksum::compute_and_set`].
    pub fn serialize(&self) -> [u8; PACKET_OVERHEAD] {
        let mut buf = [0u8; PACKET_OVERHEAD];
        let mut w: &mut [u8] = &mut buf;
        // Writes into a fixed-size buffer cannot fail.
        let _ = w.write_u32::<BigEndian>(self.seq_num);
        let _ = w.write_u16::<BigEndian>(self.frame_id);
        let _ = w.write_u8(self.frame_type.to_u8());
        let _ = w.write_u8(self.flags);
        let _ = w.write_u16::<BigEndian>(self.frag_index);
        let _ = w.write_u16::<BigEndian>(self.total_frags);
        let _ = w.write_u16::<BigEndian>(self.payload_size);
        let _ = w.write_u16::<BigEndian>(self.checksum);
        let _ = w.flush();
        buf
    }

    /// Parses a header from the front of a datagram. Does not verify the
    /// checksum; see [`crate::checksum::verify`].
    pub fn deserialize(buf: &[u8]) -> Result<Self> {
        if buf.len() < PACKET_OVERHEAD {
            return Err(ErrorKind::PacketInvalid);
        }
        let mut r: &[u8] = buf;
        let seq_num = r.read_u32::<BigEndian>().map_err(|_| ErrorKind::PacketInvalid)?;
        let frame_id = r.read_u16::<BigEndian>().map_err(|_| ErrorKind::PacketInvalid)?;
        let raw_type = r.read_u8().map_err(|_| ErrorKind::PacketInvalid)?;
        let flags = r.read_u8().map_err(|_| ErrorKind::PacketInvalid)?;
        let frag_index = r.read_u16::<BigEndian>().map_err(|_| ErrorKind::PacketInvalid)?;
        let total_frags = r.read_u16::<BigEndian>().map_err(|_| ErrorKind::PacketInvalid)?;
        let payload_size = r.read_u16::<BigEndian>().map_err(|_| ErrorKind::PacketInvalid)?;
        let checksum = r.read_u16::<BigEndian>().map_err(|_| ErrorKind::PacketInvalid)?;
        Ok(Self {
            seq_num,
            frame_id,
            frame_type: FrameType::try_from(raw_type)?,
            flags,
            frag_index,
            total_frags,
            payload_size,
            checksum,
        })
    }

    /// Enforces the header invariants against the configured MTU:
    /// `frag_index < total_frags`, `total_frags >= 1`, and
    /// `payload_size <= mtu - HEADER_SIZE`.
    pub fn validate(&self, mtu: u16) -> bool {
        if self.total_frags == 0 {
            return false;
        }
        if self.frag_index >= self.total_frags {
            return false;
        }
        let max_payload = mtu as usize - HEADER_SIZE;
        if self.payload_size as usize > max_payload {
            return false;
        }
        true
    }

    /// Whether this packet carries the last fragment of its frame.
    pub fn is_last_frag(&self) -> bool {
        self.flags & FLAG_LAST_FRAG != 0
    }

    /// Whether this packet is a retransmission.
    pub fn is_retrans(&self) -> bool {
        self.flags & FLAG_RETRANS != 0
    }

    /// Sets the last-fragment flag.
    pub fn set_last_frag(&mut self) {
        self.flags |= FLAG_LAST_FRAG;
    }

    /// Sets the retransmission flag.
    pub fn set_retrans(&mut self) {
        self.flags |= FLAG_RETRANS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PacketHeader {
        PacketHeader {
            seq_num: 0xDEADBEEF,
            frame_id: 0x1234,
            frame_type: FrameType::I,
            flags: FLAG_LAST_FRAG | FLAG_RETRANS,
            frag_index: 3,
            total_frags: 4,
            payload_size: 1386,
            checksum: 0xABCD,
        }
    }

    #[test]
    fn test_round_trip_every_field() {
        let header = sample();
        let buf = header.serialize();
        let parsed = PacketHeader::deserialize(&buf).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_wire_layout_is_big_endian() {
        let header = sample();
        let buf = header.serialize();
        assert_eq!(&buf[0..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(&buf[4..6], &[0x12, 0x34]);
        assert_eq!(buf[6], 1); // FrameType::I
        assert_eq!(buf[7], FLAG_LAST_FRAG | FLAG_RETRANS);
        assert_eq!(&buf[8..10], &[0x00, 0x03]);
        assert_eq!(&buf[10..12], &[0x00, 0x04]);
        assert_eq!(&buf[12..14], &[0x05, 0x6A]); // 1386
        assert_eq!(&buf[14..16], &[0xAB, 0xCD]);
    }

    #[test]
    fn test_deserialize_rejects_short_input() {
        let buf = [0u8; PACKET_OVERHEAD - 1];
        assert_eq!(PacketHeader::deserialize(&buf).unwrap_err(), ErrorKind::PacketInvalid);
    }

    #[test]
    fn test_deserialize_rejects_unknown_frame_type() {
        let mut buf = sample().serialize();
        buf[6] = 0x7F;
        assert_eq!(PacketHeader::deserialize(&buf).unwrap_err(), ErrorKind::PacketInvalid);
    }

    #[test]
    fn test_validate_invariants() {
        let mut header = sample();
        assert!(header.validate(1400));

        header.frag_index = 4; // == total_frags
        assert!(!header.validate(1400));

        header = sample();
        header.total_frags = 0;
        assert!(!header.validate(1400));

        header = sample();
        header.payload_size = 1387; // > 1400 - 14
        assert!(!header.validate(1400));
        assert!(header.validate(1401));
    }

    #[test]
    fn test_control_header_shape() {
        let header = PacketHeader::control(FrameType::Heartbeat, 9, 0);
        assert_eq!(header.total_frags, 1);
        assert_eq!(header.frag_index, 0);
        assert_eq!(header.payload_size, 0);
        assert!(header.validate(1400));
    }

    #[test]
    fn test_flag_accessors() {
        let mut header = PacketHeader::control(FrameType::Ack, 0, 0);
        assert!(!header.is_last_frag());
        assert!(!header.is_retrans());
        header.set_last_frag();
        header.set_retrans();
        assert!(header.is_last_frag());
        assert!(header.is_retrans());
    }
}

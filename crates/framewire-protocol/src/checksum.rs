//! CRC-16/CCITT checksum over header and payload.
//!
//! Polynomial 0x1021, initial value 0xFFFF, MSB-first, no reflection,
//! no final XOR (the IBM-3740 parameterization; check value 0x29B1).
//! The digest covers the 14 header-field bytes followed by the payload;
//! the checksum slot itself at bytes [14..16) is excluded.

use byteorder::{BigEndian, ByteOrder};
use crc::{Crc, CRC_16_IBM_3740};

use crate::header::{HEADER_SIZE, PACKET_OVERHEAD};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// CRC-16/CCITT of a single buffer.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

fn digest(header: &[u8], payload: &[u8]) -> u16 {
    let mut digest = CRC16.digest();
    digest.update(&header[..HEADER_SIZE]);
    if !payload.is_empty() {
        digest.update(payload);
    }
    digest.finalize()
}

/// Computes the packet CRC and patches it big-endian into the checksum
/// slot of the serialized header. Returns the CRC.
///
/// `buf` must hold at least [`PACKET_OVERHEAD`] bytes of serialized
/// header.
pub fn compute_and_set(buf: &mut [u8], payload: &[u8]) -> u16 {
    debug_assert!(buf.len() >= PACKET_OVERHEAD);
    let crc = digest(buf, payload);
    BigEndian::write_u16(&mut buf[HEADER_SIZE..PACKET_OVERHEAD], crc);
    crc
}

/// Recomputes the packet CRC and compares it with the received checksum
/// slot.
pub fn verify(buf: &[u8], payload: &[u8]) -> bool {
    if buf.len() < PACKET_OVERHEAD {
        return false;
    }
    let received = BigEndian::read_u16(&buf[HEADER_SIZE..PACKET_OVERHEAD]);
    digest(buf, payload) == received
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::PacketHeader;
    use framewire_core::frame_type::FrameType;

    #[test]
    fn test_ccitt_check_value() {
        // The standard check input for CRC-16/CCITT (poly 0x1021,
        // init 0xFFFF, no final XOR).
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_compute_then_verify() {
        let payload = b"some fragment payload";
        let mut header = PacketHeader::control(FrameType::User, 7, 3);
        header.payload_size = payload.len() as u16;
        let mut buf = header.serialize();

        let crc = compute_and_set(&mut buf, payload);
        assert_ne!(crc, 0);
        assert!(verify(&buf, payload));
    }

    #[test]
    fn test_verify_empty_payload() {
        let header = PacketHeader::control(FrameType::Heartbeat, 1, 0);
        let mut buf = header.serialize();
        compute_and_set(&mut buf, &[]);
        assert!(verify(&buf, &[]));
    }

    #[test]
    fn test_verify_rejects_corrupted_payload() {
        let mut payload = b"payload bytes".to_vec();
        let mut header = PacketHeader::control(FrameType::User, 2, 1);
        header.payload_size = payload.len() as u16;
        let mut buf = header.serialize();
        compute_and_set(&mut buf, &payload);

        payload[4] ^= 0x01;
        assert!(!verify(&buf, &payload));
    }

    #[test]
    fn test_verify_rejects_corrupted_header() {
        let payload = b"payload bytes";
        let mut header = PacketHeader::control(FrameType::User, 2, 1);
        header.payload_size = payload.len() as u16;
        let mut buf = header.serialize();
        compute_and_set(&mut buf, payload);

        buf[0] ^= 0x80;
        assert!(!verify(&buf, payload));
    }

    #[test]
    fn test_checksum_slot_excluded_from_digest() {
        let header = PacketHeader::control(FrameType::Ack, 5, 0);
        let mut a = header.serialize();
        let mut b = header.serialize();
        b[HEADER_SIZE] = 0xFF;
        b[HEADER_SIZE + 1] = 0xFF;
        // Different junk in the slot, same computed CRC.
        assert_eq!(compute_and_set(&mut a, &[]), compute_and_set(&mut b, &[]));
    }
}

#![warn(missing_docs)]

//! framewire-protocol: the wire format.
//!
//! Everything that touches bytes on the wire lives here:
//! - [`header`]: the fixed-layout packet header and its codec
//! - [`checksum`]: CRC-16/CCITT over header and payload
//! - [`fragment`]: fragmentation arithmetic shared by both endpoints
//!
//! All multi-byte fields are big-endian. The header is serialized field
//! by field — nothing depends on struct layout.

pub mod checksum;
pub mod fragment;
pub mod header;

pub use header::{PacketHeader, CHECKSUM_SIZE, HEADER_SIZE, PACKET_OVERHEAD};

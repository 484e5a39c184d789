#![warn(missing_docs)]

//! framewire-core: foundational types and utilities.
//!
//! This crate provides the minimal set of building blocks shared across
//! the workspace:
//! - Configuration types
//! - Error handling
//! - Frame type vocabulary
//! - Pooled, reusable frame buffers and fragment trackers
//! - The frame queue used by the send/receive engines
//!
//! Protocol-specific logic lives in specialized crates:
//! - `framewire-protocol`: packet header codec, checksum, fragmentation math
//! - `framewire-endpoint`: the TX/RX transport engines

/// Protocol constants shared across layers.
pub mod constants {
    /// Default maximum transmission unit in bytes (header + payload).
    pub const DEFAULT_MTU: u16 = 1400;
    /// Maximum payload capacity of a media frame (512 KiB).
    pub const MAX_FRAME_SIZE: usize = 512 * 1024;
    /// Payload capacity of a control frame.
    pub const CTRL_FRAME_SIZE: usize = 128;
    /// Default socket send buffer size (2 MiB).
    pub const DEFAULT_SEND_BUF: usize = 2 * 1024 * 1024;
    /// Default socket receive buffer size (2 MiB).
    pub const DEFAULT_RECV_BUF: usize = 2 * 1024 * 1024;
    /// Maximum media URL length carried by a START frame, terminator included.
    pub const MAX_URL_SIZE: usize = 100;
    /// Initial number of preallocated frames in a media pool.
    pub const MEDIA_POOL_INIT: usize = 2;
    /// Initial number of preallocated frames in a control pool.
    pub const CTRL_POOL_INIT: usize = 8;
    /// Largest fragment count a tracker can be allocated for.
    pub const MAX_TRACKED_FRAGS: u16 = 512;
}

/// Configuration options for both transport endpoints.
pub mod config;
/// Error kinds and result alias.
pub mod error;
/// Fragment tracker slab pool.
pub mod frag;
/// Pooled, reusable frame buffers.
pub mod frame;
/// Frame type vocabulary shared by every layer.
pub mod frame_type;
/// Packet interception for loss injection and inspection.
pub mod interceptor;
/// Ordered frame queue with age-based sweeping.
pub mod queue;

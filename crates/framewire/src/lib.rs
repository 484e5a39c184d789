#![warn(missing_docs)]

//! Framewire: a small public API facade for the workspace.
//!
//! Framewire streams pre-encoded video frames over UDP with sub-frame
//! latency: keyframes are protected by per-fragment selective
//! retransmission while predicted frames are simply dropped on loss.
//! Both endpoints also exchange small reliable datagrams, heartbeats,
//! and media lifecycle control messages.
//!
//! The facade re-exports the surface most applications need:
//!
//! - Endpoints ([`VideoTx`], [`VideoRx`]) and their statistics
//! - Frame buffers ([`Frame`]) and the frame type vocabulary
//! - Configuration ([`Config`]) and error kinds
//!
//! Example
//! ```ignore
//! use std::time::Duration;
//! use framewire::{Config, FrameType, VideoRx, VideoTx};
//!
//! let tx = VideoTx::bind("0.0.0.0:7000", Config::default())?;
//! let rx = VideoRx::new("127.0.0.1:7000", Config::default(), Box::new(|payload, ty| {
//!     println!("frame: {} bytes ({ty:?})", payload.len());
//! }))?;
//!
//! rx.connect()?;
//! tx.accept(Duration::from_secs(5))?;
//!
//! let mut frame = tx.alloc_media_frame();
//! frame.write_at(0, &encoded_keyframe)?;
//! frame.frame_type = FrameType::I;
//! tx.send_media(frame)?;
//! ```

// Core configuration, errors, and frame vocabulary
pub use framewire_core::{
    config::Config,
    error::{ErrorKind, Result},
    frame::{Frame, FramePool, PoolStats},
    frame_type::FrameType,
    interceptor::Interceptor,
};
// Endpoints: the sender/receiver engines and their statistics
pub use framewire_endpoint::{ConnectionState, RxStats, TxStats, VideoRx, VideoTx};
// Wire-level constants, for embedders that budget around the MTU
pub use framewire_protocol::{fragment, CHECKSUM_SIZE, HEADER_SIZE, PACKET_OVERHEAD};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        Config, ConnectionState, ErrorKind, Frame, FrameType, Result, RxStats, TxStats, VideoRx,
        VideoTx,
    };
}

/// Library version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

/// The version string of this crate.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// The structured version of this crate.
pub fn version_info() -> Version {
    Version {
        major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
        minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
        patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
    }
}

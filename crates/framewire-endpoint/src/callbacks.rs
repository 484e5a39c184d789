use framewire_core::frame_type::FrameType;

/// Invoked on the receiver for each completed media frame. The payload
/// is valid only for the duration of the call.
pub type FrameCallback = Box<dyn FnMut(&[u8], FrameType) + Send>;

/// Invoked for reliable user datagrams, and on the sender for a
/// surfaced disconnect (with [`FrameType::Disconnect`] and an empty
/// payload).
pub type DataCallback = Box<dyn FnMut(FrameType, &[u8]) + Send>;

/// Invoked on the receiver when the connection is established (`true`)
/// or lost (`false`).
pub type ConnectCallback = Box<dyn FnMut(bool) + Send>;

/// Invoked on the sender for START/STOP media control. START may carry
/// a URL.
pub type MediaControlCallback = Box<dyn FnMut(FrameType, Option<&str>) + Send>;

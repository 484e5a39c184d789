//! Ordered frame queue with age-based sweeping.
//!
//! Queues own the frames pushed into them; removing a frame hands
//! ownership back to the caller, and dropping it returns the buffer to
//! its pool. Lookup is a linear scan — queue depths stay small (a few
//! hundred entries at peak).

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::frame::Frame;

/// A lock-protected, ordered list of frames indexed by frame id.
pub struct FrameQueue {
    frames: Mutex<VecDeque<Frame>>,
    timeout: Option<Duration>,
}

impl FrameQueue {
    /// Creates a queue. Frames older than `timeout` (measured from their
    /// `first_recv` timestamp) are reaped by [`FrameQueue::sweep`];
    /// `None` disables sweeping.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { frames: Mutex::new(VecDeque::new()), timeout }
    }

    /// Appends a frame, taking ownership.
    pub fn push(&self, frame: Frame) {
        self.frames.lock().push_back(frame);
    }

    /// Detaches and returns the head frame.
    pub fn pop(&self) -> Option<Frame> {
        self.frames.lock().pop_front()
    }

    /// Detaches and returns the frame with the given id.
    pub fn remove(&self, frame_id: u16) -> Option<Frame> {
        let mut frames = self.frames.lock();
        let index = frames.iter().position(|frame| frame.frame_id == frame_id)?;
        frames.remove(index)
    }

    /// Whether a frame with the given id is queued.
    pub fn contains(&self, frame_id: u16) -> bool {
        self.frames.lock().iter().any(|frame| frame.frame_id == frame_id)
    }

    /// Runs `f` against the queued frame with the given id, if present.
    pub fn with_mut<R>(&self, frame_id: u16, f: impl FnOnce(&mut Frame) -> R) -> Option<R> {
        let mut frames = self.frames.lock();
        frames.iter_mut().find(|frame| frame.frame_id == frame_id).map(f)
    }

    /// Keeps every frame for which `keep` returns true; detached frames
    /// are returned to the caller in queue order.
    pub fn retain_mut(&self, mut keep: impl FnMut(&mut Frame) -> bool) -> Vec<Frame> {
        let mut frames = self.frames.lock();
        let mut removed = Vec::new();
        let mut index = 0;
        while index < frames.len() {
            if keep(&mut frames[index]) {
                index += 1;
            } else if let Some(frame) = frames.remove(index) {
                removed.push(frame);
            }
        }
        removed
    }

    /// Detaches every frame whose age exceeds the queue timeout.
    pub fn sweep(&self, now: Instant) -> Vec<Frame> {
        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => return Vec::new(),
        };
        let expired = self.retain_mut(|frame| match frame.first_recv {
            Some(first) => now.duration_since(first) < timeout,
            None => true,
        });
        for frame in &expired {
            debug!(
                frame_id = frame.frame_id,
                frags = frame.recv_frags,
                total = frame.total_frags,
                "frame timed out in queue"
            );
        }
        expired
    }

    /// Detaches every queued frame.
    pub fn drain(&self) -> Vec<Frame> {
        self.frames.lock().drain(..).collect()
    }

    /// Number of queued frames.
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Returns true when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

impl std::fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameQueue")
            .field("len", &self.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

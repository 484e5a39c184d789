//! Pooled, reusable frame buffers.
//!
//! A [`FramePool`] preallocates fixed-capacity buffers and hands out
//! owning [`Frame`] handles. Dropping the last handle resets the slot
//! and returns its buffer to the pool, so queues and caches simply own
//! frames and release them by letting them go out of scope. The pool
//! grows on demand when the free list runs dry.

use std::{
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Instant,
};

use parking_lot::Mutex;
use tracing::warn;

use crate::{
    error::{ErrorKind, Result},
    frag::FragTracker,
    frame_type::FrameType,
};

/// Lifecycle state of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    /// Freshly acquired, not yet in use.
    #[default]
    Free,
    /// Accumulating fragments on the receive side.
    Receiving,
    /// All fragments received.
    Complete,
    /// Transmitted, possibly awaiting acknowledgment.
    Sending,
}

/// The buffer and metadata behind a [`Frame`] handle.
#[derive(Debug)]
pub struct FrameSlot {
    /// Identifies the logical frame; fragments share it.
    pub frame_id: u16,
    /// Media or control class of the frame.
    pub frame_type: FrameType,
    /// Lifecycle state.
    pub state: FrameState,
    /// Fragment count of the frame (1 for control frames).
    pub total_frags: u16,
    /// Fragments accumulated so far (receive side).
    pub recv_frags: u16,
    /// Per-fragment reassembly or retransmission records.
    pub tracker: Option<FragTracker>,
    /// When the first fragment arrived.
    pub first_recv: Option<Instant>,
    /// When the most recent fragment arrived.
    pub last_recv: Option<Instant>,
    /// When the frame (or its latest retransmission) was sent.
    pub send_time: Option<Instant>,
    /// Whole-frame retransmission count (reliable datagrams).
    pub retrans_count: u8,
    len: usize,
    data: Box<[u8]>,
}

impl FrameSlot {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            frame_id: 0,
            frame_type: FrameType::User,
            state: FrameState::Free,
            total_frags: 0,
            recv_frags: 0,
            tracker: None,
            first_recv: None,
            last_recv: None,
            send_time: None,
            retrans_count: 0,
            len: 0,
            data: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    /// The filled portion of the payload buffer.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The entire capacity buffer, for callers that fill it directly.
    /// Pair with [`FrameSlot::set_len`].
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Current payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when no payload bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Sets the payload length after the buffer has been filled directly.
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > self.data.len() {
            return Err(ErrorKind::Overflow);
        }
        self.len = len;
        Ok(())
    }

    /// Copies `src` into the buffer at `offset`, extending the payload
    /// length to cover the written range.
    pub fn write_at(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        let end = offset.checked_add(src.len()).ok_or(ErrorKind::Overflow)?;
        if end > self.data.len() {
            return Err(ErrorKind::Overflow);
        }
        self.data[offset..end].copy_from_slice(src);
        if end > self.len {
            self.len = end;
        }
        Ok(())
    }

    /// Copies payload bytes at `offset` into `dst`. The requested range
    /// must lie entirely within the current payload.
    pub fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        let end = offset.checked_add(dst.len()).ok_or(ErrorKind::Overflow)?;
        if end > self.len {
            return Err(ErrorKind::Overflow);
        }
        dst.copy_from_slice(&self.data[offset..end]);
        Ok(())
    }

    /// Prepares the frame to accumulate fragments on the receive side.
    pub fn init_recv(
        &mut self,
        frame_id: u16,
        frame_type: FrameType,
        total_frags: u16,
        tracker: FragTracker,
        now: Instant,
    ) {
        self.frame_id = frame_id;
        self.frame_type = frame_type;
        self.total_frags = total_frags;
        self.recv_frags = 0;
        self.len = 0;
        self.tracker = Some(tracker);
        self.state = FrameState::Receiving;
        self.first_recv = Some(now);
        self.last_recv = Some(now);
        self.retrans_count = 0;
    }

    /// Returns true once every fragment has been accumulated.
    pub fn is_complete(&self) -> bool {
        self.total_frags > 0 && self.recv_frags == self.total_frags
    }

    fn reset(&mut self) {
        self.frame_id = 0;
        self.frame_type = FrameType::User;
        self.state = FrameState::Free;
        self.total_frags = 0;
        self.recv_frags = 0;
        self.tracker = None;
        self.first_recv = None;
        self.last_recv = None;
        self.send_time = None;
        self.retrans_count = 0;
        self.len = 0;
        // Buffer contents are left as-is; capacity is reused.
    }
}

struct PoolShared {
    free: Mutex<Vec<Box<FrameSlot>>>,
    capacity: usize,
    total: AtomicUsize,
    outstanding: AtomicUsize,
    peak: AtomicUsize,
    acquires: AtomicUsize,
    releases: AtomicUsize,
}

impl PoolShared {
    fn reinsert(&self, mut slot: Box<FrameSlot>) {
        slot.reset();
        self.free.lock().push(slot);
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        self.releases.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of a pool's accounting counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Frames ever allocated by this pool.
    pub total: usize,
    /// Frames sitting in the free list.
    pub free: usize,
    /// Frames currently handed out.
    pub outstanding: usize,
    /// High-water mark of outstanding frames.
    pub peak: usize,
    /// Cumulative acquire operations.
    pub acquires: usize,
    /// Cumulative release operations.
    pub releases: usize,
    /// Payload capacity of each frame.
    pub frame_capacity: usize,
}

/// A pool of fixed-capacity frame buffers.
pub struct FramePool {
    shared: Arc<PoolShared>,
}

impl FramePool {
    /// Creates a pool with `initial` preallocated frames of `capacity`
    /// payload bytes each.
    pub fn new(initial: usize, capacity: usize) -> Self {
        let mut free = Vec::with_capacity(initial);
        for _ in 0..initial {
            free.push(Box::new(FrameSlot::with_capacity(capacity)));
        }
        Self {
            shared: Arc::new(PoolShared {
                free: Mutex::new(free),
                capacity,
                total: AtomicUsize::new(initial),
                outstanding: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                acquires: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
            }),
        }
    }

    /// Takes a frame from the free list, allocating a new one if the
    /// pool is empty. The returned handle owns the buffer; dropping it
    /// returns the buffer here.
    pub fn acquire(&self) -> Frame {
        let slot = self.shared.free.lock().pop();
        // Allocation happens outside the free-list lock.
        let slot = slot.unwrap_or_else(|| {
            self.shared.total.fetch_add(1, Ordering::Relaxed);
            Box::new(FrameSlot::with_capacity(self.shared.capacity))
        });

        let outstanding = self.shared.outstanding.fetch_add(1, Ordering::Relaxed) + 1;
        self.shared.peak.fetch_max(outstanding, Ordering::Relaxed);
        self.shared.acquires.fetch_add(1, Ordering::Relaxed);

        Frame { slot: Some(slot), shared: Arc::clone(&self.shared) }
    }

    /// Number of frames currently handed out.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Relaxed)
    }

    /// Accounting snapshot.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total: self.shared.total.load(Ordering::Relaxed),
            free: self.shared.free.lock().len(),
            outstanding: self.shared.outstanding.load(Ordering::Relaxed),
            peak: self.shared.peak.load(Ordering::Relaxed),
            acquires: self.shared.acquires.load(Ordering::Relaxed),
            releases: self.shared.releases.load(Ordering::Relaxed),
            frame_capacity: self.shared.capacity,
        }
    }
}

impl Drop for FramePool {
    fn drop(&mut self) {
        let outstanding = self.shared.outstanding.load(Ordering::Relaxed);
        if outstanding > 0 {
            warn!(outstanding, "frame pool destroyed with frames still in use");
        }
    }
}

impl std::fmt::Debug for FramePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("FramePool")
            .field("capacity", &stats.frame_capacity)
            .field("total", &stats.total)
            .field("outstanding", &stats.outstanding)
            .finish()
    }
}

/// Owning handle to a pooled frame buffer.
///
/// Dropping the handle resets the slot and returns it to the pool that
/// produced it.
pub struct Frame {
    slot: Option<Box<FrameSlot>>,
    shared: Arc<PoolShared>,
}

impl Deref for Frame {
    type Target = FrameSlot;

    fn deref(&self) -> &FrameSlot {
        self.slot.as_ref().expect("frame slot present until drop")
    }
}

impl DerefMut for Frame {
    fn deref_mut(&mut self) -> &mut FrameSlot {
        self.slot.as_mut().expect("frame slot present until drop")
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.shared.reinsert(slot);
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("frame_id", &self.frame_id)
            .field("frame_type", &self.frame_type)
            .field("state", &self.state)
            .field("len", &self.len())
            .field("frags", &format_args!("{}/{}", self.recv_frags, self.total_frags))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_has_clean_state() {
        let pool = FramePool::new(2, 64);
        let frame = pool.acquire();
        assert_eq!(frame.state, FrameState::Free);
        assert_eq!(frame.len(), 0);
        assert_eq!(frame.capacity(), 64);
        assert!(frame.tracker.is_none());
    }

    #[test]
    fn test_drop_returns_to_pool() {
        let pool = FramePool::new(1, 16);
        let frame = pool.acquire();
        assert_eq!(pool.outstanding(), 1);
        drop(frame);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.stats().free, 1);
        // Reused, not reallocated.
        let _frame = pool.acquire();
        assert_eq!(pool.stats().total, 1);
    }

    #[test]
    fn test_pool_grows_when_exhausted() {
        let pool = FramePool::new(1, 16);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.stats().total, 2);
        assert_eq!(pool.outstanding(), 2);
        drop(a);
        drop(b);
        assert_eq!(pool.stats().free, 2);
    }

    #[test]
    fn test_reused_frame_is_reset() {
        let pool = FramePool::new(1, 32);
        {
            let mut frame = pool.acquire();
            frame.frame_id = 42;
            frame.frame_type = FrameType::I;
            frame.state = FrameState::Sending;
            frame.write_at(0, b"dirty").unwrap();
        }
        let frame = pool.acquire();
        assert_eq!(frame.frame_id, 0);
        assert_eq!(frame.state, FrameState::Free);
        assert_eq!(frame.len(), 0);
    }

    #[test]
    fn test_write_at_extends_len() {
        let pool = FramePool::new(1, 32);
        let mut frame = pool.acquire();
        frame.write_at(8, &[1, 2, 3, 4]).unwrap();
        assert_eq!(frame.len(), 12);
        // A write inside the existing range does not shrink the length.
        frame.write_at(0, &[9, 9]).unwrap();
        assert_eq!(frame.len(), 12);
        assert_eq!(&frame.payload()[..2], &[9, 9]);
    }

    #[test]
    fn test_write_at_rejects_overflow() {
        let pool = FramePool::new(1, 8);
        let mut frame = pool.acquire();
        assert_eq!(frame.write_at(4, &[0; 8]), Err(ErrorKind::Overflow));
        assert_eq!(frame.len(), 0);
    }

    #[test]
    fn test_read_at_bounds() {
        let pool = FramePool::new(1, 16);
        let mut frame = pool.acquire();
        frame.write_at(0, &[1, 2, 3, 4, 5]).unwrap();

        let mut out = [0u8; 3];
        frame.read_at(1, &mut out).unwrap();
        assert_eq!(out, [2, 3, 4]);

        let mut too_far = [0u8; 4];
        assert_eq!(frame.read_at(3, &mut too_far), Err(ErrorKind::Overflow));
    }

    #[test]
    fn test_peak_accounting() {
        let pool = FramePool::new(0, 8);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        let c = pool.acquire();
        assert_eq!(pool.stats().peak, 2);
        assert_eq!(pool.stats().acquires, 3);
        drop(b);
        drop(c);
        assert_eq!(pool.stats().releases, 3);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        use std::thread;

        let pool = std::sync::Arc::new(FramePool::new(4, 32));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = std::sync::Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let mut frame = pool.acquire();
                    frame.write_at(0, &[0xAB; 16]).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.stats().acquires, 800);
    }
}

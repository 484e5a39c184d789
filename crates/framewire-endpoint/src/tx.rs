//! Sender engine.
//!
//! `VideoTx` binds a UDP socket, waits for a receiver to connect, and
//! streams fragmented media frames plus reliable user datagrams. The
//! poll loop interleaves receiving control traffic with timer-driven
//! retransmission sweeps: unacknowledged reliable datagrams are resent
//! whole, while the most recent I-frame is retained and retransmitted
//! fragment by fragment until every fragment is acknowledged or a newer
//! I-frame supersedes it.

use std::{
    net::{SocketAddr, ToSocketAddrs},
    sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering},
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use framewire_core::{
    config::Config,
    error::{ErrorKind, Result},
    frag::FragTrackerPool,
    frame::{Frame, FramePool, FrameState},
    frame_type::FrameType,
    interceptor::{Interceptor, NoOpInterceptor},
    queue::FrameQueue,
};
use framewire_protocol::{checksum, fragment, header::PacketHeader, PACKET_OVERHEAD};

use crate::{
    callbacks::{DataCallback, MediaControlCallback},
    connection::{ConnectionState, Handshake},
    socket::UdpChannel,
    statistics::TxStats,
};

const POLL_SLEEP: Duration = Duration::from_millis(1);
// The sender only ever receives control traffic, which fits well under this.
const RECV_BUF_LEN: usize = 2048;

/// The sending endpoint of a framewire connection.
///
/// All methods take `&self`; submission APIs may be called from other
/// threads concurrently with [`VideoTx::poll`].
pub struct VideoTx {
    channel: UdpChannel,
    config: Config,
    state: Mutex<ConnectionState>,
    peer: Mutex<Option<SocketAddr>>,
    data_queue: FrameQueue,
    last_iframe: Mutex<Option<Frame>>,
    media_pool: FramePool,
    control_pool: FramePool,
    frag_pool: FragTrackerPool,
    seq_num: AtomicU32,
    frame_id: AtomicU16,
    handshake: Mutex<Handshake>,
    last_heartbeat: Mutex<Option<Instant>>,
    stats: Mutex<TxStats>,
    data_fn: Mutex<Option<DataCallback>>,
    media_fn: Mutex<Option<MediaControlCallback>>,
    interceptor: Mutex<Box<dyn Interceptor>>,
    running: AtomicBool,
}

impl VideoTx {
    /// Binds a sender to the given local address.
    pub fn bind(addr: impl ToSocketAddrs, config: Config) -> Result<Self> {
        Self::bind_with_interceptor(addr, config, Box::new(NoOpInterceptor))
    }

    /// Binds a sender with a custom packet interceptor.
    pub fn bind_with_interceptor(
        addr: impl ToSocketAddrs,
        config: Config,
        interceptor: Box<dyn Interceptor>,
    ) -> Result<Self> {
        let channel = UdpChannel::bind(addr, config.send_buffer_size, config.recv_buffer_size)?;
        info!(local = ?channel.local_addr().ok(), mtu = config.mtu, "sender bound");
        Ok(Self {
            channel,
            data_queue: FrameQueue::new(None),
            last_iframe: Mutex::new(None),
            media_pool: FramePool::new(config.media_pool_size, config.media_frame_capacity),
            control_pool: FramePool::new(config.control_pool_size, config.control_frame_capacity),
            frag_pool: FragTrackerPool::new(),
            state: Mutex::new(ConnectionState::Idle),
            peer: Mutex::new(None),
            seq_num: AtomicU32::new(0),
            frame_id: AtomicU16::new(1),
            handshake: Mutex::new(Handshake::default()),
            last_heartbeat: Mutex::new(None),
            stats: Mutex::new(TxStats::default()),
            data_fn: Mutex::new(None),
            media_fn: Mutex::new(None),
            interceptor: Mutex::new(interceptor),
            running: AtomicBool::new(true),
            config,
        })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.channel.local_addr().map_err(|_| ErrorKind::SocketBind)
    }

    /// Installs the reliable-datagram callback. Also receives a
    /// [`FrameType::Disconnect`] notification with an empty payload when
    /// the peer tears the connection down.
    pub fn on_data(&self, callback: DataCallback) {
        *self.data_fn.lock() = Some(callback);
    }

    /// Installs the START/STOP media control callback.
    pub fn on_media_control(&self, callback: MediaControlCallback) {
        *self.media_fn.lock() = Some(callback);
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Whether the handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    /// Reliable datagrams awaiting acknowledgment.
    pub fn packets_in_flight(&self) -> usize {
        self.data_queue.len()
    }

    /// Snapshot of the sender statistics.
    pub fn stats(&self) -> TxStats {
        self.stats.lock().clone()
    }

    /// Blocks until a receiver completes the handshake, polling
    /// internally, or until `timeout` elapses.
    pub fn accept(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while self.running.load(Ordering::Relaxed) {
            self.poll(POLL_SLEEP)?;
            if self.is_connected() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ErrorKind::Timeout);
            }
        }
        Err(ErrorKind::Disconnected)
    }

    /// Waits up to `timeout` for an incoming packet, processes at most
    /// one, then runs one retransmission-sweep pass. Returns whether a
    /// packet was handled.
    pub fn poll(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut handled = false;
        loop {
            if self.recv_once()? {
                handled = true;
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(POLL_SLEEP.min(deadline - now));
        }
        self.run_timers(Instant::now());
        Ok(handled)
    }

    /// Sends a reliable user datagram. The payload is retransmitted
    /// until acknowledged or the retry budget is exhausted.
    pub fn send(&self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(ErrorKind::InvalidParam);
        }
        if !self.is_connected() {
            return Err(ErrorKind::NotReady);
        }
        if data.len() > self.config.control_frame_capacity {
            return Err(ErrorKind::PacketTooLarge);
        }
        let peer = (*self.peer.lock()).ok_or(ErrorKind::NotReady)?;

        let mut frame = self.control_pool.acquire();
        frame.frame_id = self.next_frame_id();
        frame.frame_type = FrameType::User;
        frame.state = FrameState::Sending;
        frame.write_at(0, data)?;
        frame.send_time = Some(Instant::now());

        let header = PacketHeader {
            seq_num: self.next_seq(),
            frame_id: frame.frame_id,
            frame_type: FrameType::User,
            flags: 0,
            frag_index: 0,
            total_frags: 1,
            payload_size: data.len() as u16,
            checksum: 0,
        };
        self.emit(peer, &header, frame.payload())?;
        self.data_queue.push(frame);
        Ok(())
    }

    /// Takes a media frame buffer from the pool for the caller to fill.
    pub fn alloc_media_frame(&self) -> Frame {
        self.media_pool.acquire()
    }

    /// Fragments and transmits a media frame. The caller must have set
    /// the payload and `frame_type`. I-frames are retained for
    /// per-fragment retransmission until superseded.
    pub fn send_media(&self, mut frame: Frame) -> Result<()> {
        if !self.is_connected() {
            return Err(ErrorKind::NotReady);
        }
        let peer = (*self.peer.lock()).ok_or(ErrorKind::NotReady)?;
        let len = frame.len();
        if len == 0 || len > frame.capacity() {
            return Err(ErrorKind::InvalidParam);
        }

        let now = Instant::now();
        let mtu = self.config.mtu;
        let total_frags = fragment::fragment_count(len, mtu);

        frame.frame_id = self.next_frame_id();
        frame.send_time = Some(now);
        frame.state = FrameState::Sending;
        frame.total_frags = total_frags;
        if frame.frame_type == FrameType::I {
            frame.tracker = Some(self.frag_pool.acquire(total_frags)?);
        }

        for index in 0..total_frags {
            let offset = fragment::fragment_offset(index, mtu);
            let size = fragment::fragment_size(len, index, mtu);
            let seq = self.next_seq();

            let mut header = PacketHeader {
                seq_num: seq,
                frame_id: frame.frame_id,
                frame_type: frame.frame_type,
                flags: 0,
                frag_index: index,
                total_frags,
                payload_size: size as u16,
                checksum: 0,
            };
            if index == total_frags - 1 {
                header.set_last_frag();
            }

            if let Err(err) = self.emit(peer, &header, &frame.payload()[offset..offset + size]) {
                warn!(frame_id = frame.frame_id, index, total_frags, "media fragment send failed");
                self.stats.lock().dropped_frames += 1;
                return Err(err);
            }

            if let Some(tracker) = frame.tracker.as_mut() {
                let slot = &mut tracker.slots_mut()[index as usize];
                slot.frag_index = index;
                slot.seq_num = seq;
                slot.send_time = Some(now);
            }
        }

        {
            let mut stats = self.stats.lock();
            stats.total_frames += 1;
            match frame.frame_type {
                FrameType::I => stats.total_i_frames += 1,
                FrameType::P => stats.total_p_frames += 1,
                _ => {}
            }
        }

        if frame.frame_type == FrameType::I {
            // Superseding the retained I-frame cancels its outstanding
            // retransmissions; the old frame and tracker return to
            // their pools here.
            let previous = self.last_iframe.lock().replace(frame);
            drop(previous);
        }
        Ok(())
    }

    /// Sends DISCONNECT to the peer (if connected) and closes the
    /// endpoint.
    pub fn close(&self) -> Result<()> {
        let peer = *self.peer.lock();
        let mut state = self.state.lock();
        if *state == ConnectionState::Connected {
            if let Some(peer) = peer {
                let header =
                    PacketHeader::control(FrameType::Disconnect, self.next_seq(), 0);
                // Teardown is best-effort; no retransmission.
                let _ = self.emit(peer, &header, &[]);
            }
            info!("connection closed");
        }
        *state = ConnectionState::Closed;
        Ok(())
    }

    fn next_seq(&self) -> u32 {
        self.seq_num.fetch_add(1, Ordering::Relaxed)
    }

    /// Frame id 0 is reserved for handshake/heartbeat acknowledgments,
    /// so the counter skips it on wrap.
    fn next_frame_id(&self) -> u16 {
        loop {
            let id = self.frame_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }

    fn emit(&self, peer: SocketAddr, header: &PacketHeader, payload: &[u8]) -> Result<()> {
        let mut buf = header.serialize();
        checksum::compute_and_set(&mut buf, payload);

        if !self.interceptor.lock().on_send(&peer, &buf, payload) {
            trace!(seq = header.seq_num, "outgoing packet dropped by interceptor");
            // The transport believes the packet left; only the wire lost it.
            let mut stats = self.stats.lock();
            stats.total_packets += 1;
            stats.total_bytes += (buf.len() + payload.len()) as u64;
            return Ok(());
        }

        match self.channel.send_to(peer, &buf, payload) {
            Ok(sent) => {
                let mut stats = self.stats.lock();
                stats.total_packets += 1;
                stats.total_bytes += sent as u64;
                Ok(())
            }
            Err(err) => Err(ErrorKind::from_send(&err)),
        }
    }

    fn send_ack(&self, peer: SocketAddr, frame_id: u16) {
        let header = PacketHeader::control(FrameType::Ack, self.next_seq(), frame_id);
        if let Err(err) = self.emit(peer, &header, &[]) {
            debug!(%err, frame_id, "failed to send ack");
        }
    }

    fn recv_once(&self) -> Result<bool> {
        let mut buf = [0u8; RECV_BUF_LEN];
        match self.channel.recv_from(&mut buf) {
            Ok((len, from)) => {
                if !self.interceptor.lock().on_receive(&from, &buf[..len]) {
                    trace!("incoming packet dropped by interceptor");
                    return Ok(false);
                }
                self.process_datagram(&buf[..len], from, Instant::now());
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
            Err(err) => {
                warn!(%err, "socket receive failed");
                Err(ErrorKind::SocketRecv)
            }
        }
    }

    fn process_datagram(&self, data: &[u8], from: SocketAddr, now: Instant) {
        if data.len() < PACKET_OVERHEAD {
            debug!(len = data.len(), "runt datagram");
            return;
        }
        let (header_buf, payload) = data.split_at(PACKET_OVERHEAD);
        let header = match PacketHeader::deserialize(header_buf) {
            Ok(header) => header,
            Err(_) => {
                debug!("undecodable header");
                return;
            }
        };
        if !checksum::verify(header_buf, payload) {
            warn!(seq = header.seq_num, "checksum mismatch");
            return;
        }
        if !header.validate(self.config.mtu) {
            debug!(seq = header.seq_num, "invalid header");
            return;
        }

        match header.frame_type {
            FrameType::Ack => self.handle_ack(&header, now),
            FrameType::Connect => self.handle_connect(from, now),
            FrameType::Disconnect => self.handle_disconnect(from),
            FrameType::Heartbeat => self.handle_heartbeat(from, now),
            FrameType::Start => self.handle_start(payload),
            FrameType::Stop => self.handle_stop(),
            FrameType::User => self.handle_user(from, &header, payload),
            other => warn!(frame_type = ?other, "unexpected frame type at sender"),
        }
    }

    fn handle_ack(&self, header: &PacketHeader, now: Instant) {
        if header.frame_id == 0 {
            let mut state = self.state.lock();
            if *state == ConnectionState::ReplyPending {
                *state = ConnectionState::Connected;
                drop(state);
                self.handshake.lock().reset();
                *self.last_heartbeat.lock() = Some(now);
                info!("connection established");
            }
            return;
        }

        if let Some(frame) = self.data_queue.remove(header.frame_id) {
            trace!(frame_id = frame.frame_id, "reliable datagram acknowledged");
            return;
        }

        let mut guard = self.last_iframe.lock();
        if let Some(frame) = guard.as_mut() {
            if frame.frame_id == header.frame_id {
                if let Some(tracker) = frame.tracker.as_mut() {
                    if tracker.mark(header.frag_index) {
                        trace!(
                            frame_id = header.frame_id,
                            frag = header.frag_index,
                            "keyframe fragment acknowledged"
                        );
                    }
                }
            }
        }
    }

    fn handle_connect(&self, from: SocketAddr, now: Instant) {
        info!(%from, "connection request");
        *self.peer.lock() = Some(from);

        let header = PacketHeader::control(FrameType::Connected, self.next_seq(), 0);
        if let Err(err) = self.emit(from, &header, &[]) {
            warn!(%err, "failed to send connection reply");
        }

        *self.state.lock() = ConnectionState::ReplyPending;
        self.handshake.lock().arm(now);
    }

    fn handle_disconnect(&self, from: SocketAddr) {
        info!("disconnect request from receiver");
        self.send_ack(from, 0);
        *self.state.lock() = ConnectionState::Idle;
        self.handshake.lock().reset();
        *self.last_heartbeat.lock() = None;
        if let Some(callback) = self.data_fn.lock().as_mut() {
            callback(FrameType::Disconnect, &[]);
        }
    }

    fn handle_heartbeat(&self, from: SocketAddr, now: Instant) {
        self.send_ack(from, 0);
        *self.last_heartbeat.lock() = Some(now);
    }

    fn handle_start(&self, payload: &[u8]) {
        let url = parse_url(payload, self.config.max_url_len);
        match url {
            Some(url) => info!(url, "media start requested"),
            None => info!("media start requested (default source)"),
        }
        if let Some(callback) = self.media_fn.lock().as_mut() {
            callback(FrameType::Start, url);
        }
    }

    fn handle_stop(&self) {
        info!("media stop requested");
        if let Some(callback) = self.media_fn.lock().as_mut() {
            callback(FrameType::Stop, None);
        }
    }

    fn handle_user(&self, from: SocketAddr, header: &PacketHeader, payload: &[u8]) {
        self.send_ack(from, header.frame_id);
        if let Some(callback) = self.data_fn.lock().as_mut() {
            callback(FrameType::User, payload);
        }
    }

    fn run_timers(&self, now: Instant) {
        let peer = *self.peer.lock();
        if let Some(peer) = peer {
            self.sweep_data_queue(peer, now);
            self.sweep_iframe(peer, now);
            self.sweep_handshake(peer, now);
        }
        self.check_heartbeat(now);
    }

    fn sweep_data_queue(&self, peer: SocketAddr, now: Instant) {
        let timeout = self.config.data_retrans_timeout;
        let budget = self.config.data_max_retrans;

        let expired = self.data_queue.retain_mut(|frame| {
            if frame.retrans_count >= budget {
                return false;
            }
            let due = frame.send_time.map_or(true, |sent| now.duration_since(sent) >= timeout);
            if due {
                frame.retrans_count += 1;
                frame.send_time = Some(now);

                let mut header = PacketHeader {
                    seq_num: self.next_seq(),
                    frame_id: frame.frame_id,
                    frame_type: FrameType::User,
                    flags: 0,
                    frag_index: 0,
                    total_frags: 1,
                    payload_size: frame.len() as u16,
                    checksum: 0,
                };
                header.set_retrans();

                debug!(frame_id = frame.frame_id, count = frame.retrans_count, "retransmitting datagram");
                if self.emit(peer, &header, frame.payload()).is_ok() {
                    let mut stats = self.stats.lock();
                    stats.retrans_packets += 1;
                    stats.retrans_bytes += frame.len() as u64;
                }
            }
            true
        });

        if !expired.is_empty() {
            let mut stats = self.stats.lock();
            stats.dropped_frames += expired.len() as u64;
            for frame in &expired {
                warn!(
                    frame_id = frame.frame_id,
                    retrans = frame.retrans_count,
                    "reliable datagram dropped after exhausting retries"
                );
            }
        }
    }

    fn sweep_iframe(&self, peer: SocketAddr, now: Instant) {
        let timeout = self.config.iframe_retrans_timeout;
        let budget = self.config.iframe_max_retrans;
        let mtu = self.config.mtu;

        let mut guard = self.last_iframe.lock();
        let frame = match guard.as_mut() {
            Some(frame) => frame,
            None => return,
        };
        let frame_id = frame.frame_id;
        let frame_type = frame.frame_type;
        let total_frags = frame.total_frags;
        let frame_len = frame.len();

        let mut due = Vec::new();
        if let Some(tracker) = frame.tracker.as_mut() {
            for slot in tracker.slots_mut() {
                if slot.acked {
                    continue;
                }
                if slot.retrans_count >= budget {
                    warn!(frame_id, frag = slot.frag_index, "keyframe fragment abandoned");
                    slot.acked = true;
                    continue;
                }
                let expired =
                    slot.send_time.map_or(true, |sent| now.duration_since(sent) >= timeout);
                if expired {
                    slot.retrans_count += 1;
                    slot.send_time = Some(now);
                    slot.seq_num = self.next_seq();
                    due.push((slot.frag_index, slot.seq_num, slot.retrans_count));
                }
            }
        }

        for (index, seq, count) in due {
            let offset = fragment::fragment_offset(index, mtu);
            let size = fragment::fragment_size(frame_len, index, mtu);

            let mut header = PacketHeader {
                seq_num: seq,
                frame_id,
                frame_type,
                flags: 0,
                frag_index: index,
                total_frags,
                payload_size: size as u16,
                checksum: 0,
            };
            header.set_retrans();
            if index == total_frags - 1 {
                header.set_last_frag();
            }

            debug!(frame_id, frag = index, count, "retransmitting keyframe fragment");
            if self.emit(peer, &header, &frame.payload()[offset..offset + size]).is_ok() {
                let mut stats = self.stats.lock();
                stats.retrans_packets += 1;
                stats.retrans_bytes += size as u64;
            }
        }
    }

    fn sweep_handshake(&self, peer: SocketAddr, now: Instant) {
        if *self.state.lock() != ConnectionState::ReplyPending {
            return;
        }
        let mut handshake = self.handshake.lock();
        let sent = match handshake.send_time {
            Some(sent) => sent,
            None => return,
        };
        if handshake.retrans_count >= self.config.connect_max_retrans {
            warn!("handshake failed: reply retries exhausted");
            handshake.reset();
            drop(handshake);
            *self.state.lock() = ConnectionState::Idle;
            return;
        }
        if now.duration_since(sent) >= self.config.connect_retrans_timeout {
            handshake.retrans_count += 1;
            handshake.send_time = Some(now);
            let count = handshake.retrans_count;
            drop(handshake);

            let mut header = PacketHeader::control(FrameType::Connected, self.next_seq(), 0);
            header.set_retrans();
            debug!(count, "retransmitting connection reply");
            let _ = self.emit(peer, &header, &[]);
        }
    }

    fn check_heartbeat(&self, now: Instant) {
        if *self.state.lock() != ConnectionState::Connected {
            return;
        }
        let mut last_guard = self.last_heartbeat.lock();
        let last = match *last_guard {
            Some(last) => last,
            None => return,
        };
        if now.duration_since(last) >= self.config.liveness_window() {
            warn!(
                max_miss = self.config.heartbeat_max_miss,
                "heartbeat timeout, declaring connection dead"
            );
            *last_guard = None;
            drop(last_guard);
            *self.state.lock() = ConnectionState::Idle;
            *self.peer.lock() = None;
            self.handshake.lock().reset();
        }
    }
}

impl Drop for VideoTx {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = self.close();
        drop(self.data_queue.drain());
        drop(self.last_iframe.lock().take());
    }
}

impl std::fmt::Debug for VideoTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTx")
            .field("local_addr", &self.channel.local_addr().ok())
            .field("state", &self.connection_state())
            .field("in_flight", &self.packets_in_flight())
            .finish()
    }
}

fn parse_url(payload: &[u8], max_len: usize) -> Option<&str> {
    if payload.is_empty() {
        return None;
    }
    if payload.len() > max_len {
        warn!(len = payload.len(), "start URL too long, ignoring");
        return None;
    }
    let (&last, body) = payload.split_last()?;
    if last != 0 {
        warn!("start URL missing null terminator, ignoring");
        return None;
    }
    match std::str::from_utf8(body) {
        Ok(url) => Some(url),
        Err(_) => {
            warn!("start URL is not valid UTF-8, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_tx() -> VideoTx {
        VideoTx::bind("127.0.0.1:0", Config::default()).unwrap()
    }

    #[test]
    fn test_send_requires_connection() {
        let tx = bound_tx();
        assert_eq!(tx.send(b"hello").unwrap_err(), ErrorKind::NotReady);
    }

    #[test]
    fn test_send_media_requires_connection() {
        let tx = bound_tx();
        let mut frame = tx.alloc_media_frame();
        frame.write_at(0, &[1, 2, 3]).unwrap();
        frame.frame_type = FrameType::P;
        assert_eq!(tx.send_media(frame).unwrap_err(), ErrorKind::NotReady);
        // The rejected frame went back to the pool.
        assert_eq!(tx.media_pool.outstanding(), 0);
    }

    #[test]
    fn test_send_rejects_empty_payload() {
        let tx = bound_tx();
        assert_eq!(tx.send(&[]).unwrap_err(), ErrorKind::InvalidParam);
    }

    #[test]
    fn test_media_frame_capacity() {
        let tx = bound_tx();
        let frame = tx.alloc_media_frame();
        assert_eq!(frame.capacity(), 512 * 1024);
    }

    #[test]
    fn test_frame_id_skips_zero() {
        let tx = bound_tx();
        tx.frame_id.store(u16::MAX, Ordering::Relaxed);
        assert_eq!(tx.next_frame_id(), u16::MAX);
        // Wrapped past zero.
        assert_eq!(tx.next_frame_id(), 1);
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(parse_url(b"", 100), None);
        assert_eq!(parse_url(b"/video.h264\0", 100), Some("/video.h264"));
        assert_eq!(parse_url(b"/video.h264", 100), None, "missing terminator");
        assert_eq!(parse_url(&[0xFF, 0xFE, 0x00], 100), None, "not utf-8");
        let long = vec![b'a'; 101];
        assert_eq!(parse_url(&long, 100), None, "too long");
    }

    #[test]
    fn test_accept_times_out_without_peer() {
        let tx = bound_tx();
        let started = Instant::now();
        assert_eq!(tx.accept(Duration::from_millis(30)).unwrap_err(), ErrorKind::Timeout);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_close_is_idempotent() {
        let tx = bound_tx();
        tx.close().unwrap();
        tx.close().unwrap();
        assert!(tx.connection_state().is_closed());
    }
}

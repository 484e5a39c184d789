//! Receiver engine.
//!
//! `VideoRx` connects to a sender, reassembles fragmented media frames,
//! and delivers each completed frame through the frame callback.
//! Keyframe fragments are acknowledged individually so the sender can
//! retransmit exactly the fragments that were lost; partial frames that
//! outlive the reassembly timeout are reaped by the poll sweep. The
//! receiver also originates the handshake and the liveness heartbeat.

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
    callbacks::{ConnectCallback, DataCallback, FrameCallback},
    connection::{ConnectionState, Handshake},
    socket::UdpChannel,
    statistics::RxStats,
};

const POLL_SLEEP: Duration = Duration::from_millis(1);

enum FragOutcome {
    Stored { complete: bool },
    Duplicate,
    Overflow,
}

/// The receiving endpoint of a framewire connection.
///
/// All methods take `&self`; the reliable-send API may be called from
/// other threads concurrently with [`VideoRx::poll`].
pub struct VideoRx {
    channel: UdpChannel,
    server: SocketAddr,
    config: Config,
    state: Mutex<ConnectionState>,
    recv_queue: FrameQueue,
    data_queue: FrameQueue,
    last_iframe: Mutex<Option<Frame>>,
    media_pool: FramePool,
    control_pool: FramePool,
    frag_pool: FragTrackerPool,
    seq_num: AtomicU32,
    frame_id: AtomicU16,
    last_recv_seq: AtomicU32,
    handshake: Mutex<Handshake>,
    last_heartbeat_sent: Mutex<Option<Instant>>,
    last_ack_recv: Mutex<Option<Instant>>,
    stats: Mutex<RxStats>,
    frame_fn: Mutex<FrameCallback>,
    data_fn: Mutex<Option<DataCallback>>,
    connect_fn: Mutex<Option<ConnectCallback>>,
    interceptor: Mutex<Box<dyn Interceptor>>,
    running: AtomicBool,
}

impl VideoRx {
    /// Creates a receiver targeting the given sender address. `on_frame`
    /// is invoked for every completed media frame.
    pub fn new(
        server: impl ToSocketAddrs,
        config: Config,
        on_frame: FrameCallback,
    ) -> Result<Self> {
        Self::new_with_interceptor(server, config, on_frame, Box::new(NoOpInterceptor))
    }

    /// Creates a receiver with a custom packet interceptor.
    pub fn new_with_interceptor(
        server: impl ToSocketAddrs,
        config: Config,
        on_frame: FrameCallback,
        interceptor: Box<dyn Interceptor>,
    ) -> Result<Self> {
        let server = server
            .to_socket_addrs()
            .map_err(|_| ErrorKind::AddrInvalid)?
            .next()
            .ok_or(ErrorKind::AddrInvalid)?;
        let channel =
            UdpChannel::bind("0.0.0.0:0", config.send_buffer_size, config.recv_buffer_size)?;
        info!(%server, mtu = config.mtu, "receiver created");
        Ok(Self {
            channel,
            server,
            recv_queue: FrameQueue::new(Some(config.frame_timeout)),
            data_queue: FrameQueue::new(None),
            last_iframe: Mutex::new(None),
            media_pool: FramePool::new(config.media_pool_size, config.media_frame_capacity),
            control_pool: FramePool::new(config.control_pool_size, config.control_frame_capacity),
            frag_pool: FragTrackerPool::new(),
            state: Mutex::new(ConnectionState::Idle),
            seq_num: AtomicU32::new(0),
            frame_id: AtomicU16::new(1),
            last_recv_seq: AtomicU32::new(0),
            handshake: Mutex::new(Handshake::default()),
            last_heartbeat_sent: Mutex::new(None),
            last_ack_recv: Mutex::new(None),
            stats: Mutex::new(RxStats::default()),
            frame_fn: Mutex::new(on_frame),
            data_fn: Mutex::new(None),
            connect_fn: Mutex::new(None),
            interceptor: Mutex::new(interceptor),
            running: AtomicBool::new(true),
            config,
        })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.channel.local_addr().map_err(|_| ErrorKind::SocketBind)
    }

    /// Installs the reliable-datagram callback.
    pub fn on_data(&self, callback: DataCallback) {
        *self.data_fn.lock() = Some(callback);
    }

    /// Installs the connection event callback.
    pub fn on_connect(&self, callback: ConnectCallback) {
        *self.connect_fn.lock() = Some(callback);
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

    /// Snapshot of the receiver statistics.
    pub fn stats(&self) -> RxStats {
        self.stats.lock().clone()
    }

    /// Sends CONNECT to the sender and enters the handshake. Retries are
    /// driven by the poll sweep up to the configured budget.
    pub fn connect(&self) -> Result<()> {
        let now = Instant::now();
        let header = PacketHeader::control(FrameType::Connect, self.next_seq(), 0);
        self.emit(&header, &[])?;
        *self.state.lock() = ConnectionState::HandshakeSent;
        self.handshake.lock().arm(now);
        info!(server = %self.server, "connecting");
        Ok(())
    }

    /// Polls until the handshake completes or `timeout` elapses.
    pub fn wait_connected(&self, timeout: Duration) -> Result<()> {
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
        let mut buf = vec![0u8; self.config.mtu as usize + PACKET_OVERHEAD];
        let deadline = Instant::now() + timeout;
        let mut handled = false;
        loop {
            if self.recv_once(&mut buf)? {
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

    /// Sends a reliable user datagram to the sender.
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
        self.emit(&header, frame.payload())?;
        self.data_queue.push(frame);
        Ok(())
    }

    /// Asks the sender to start media transmission, optionally naming a
    /// source URL (null-terminated on the wire, at most
    /// `max_url_len` bytes including the terminator).
    pub fn start(&self, url: Option<&str>) -> Result<()> {
        if !self.is_connected() {
            return Err(ErrorKind::NotReady);
        }
        let payload = match url {
            Some(url) => {
                let bytes = url.as_bytes();
                if bytes.len() + 1 > self.config.max_url_len {
                    return Err(ErrorKind::PacketTooLarge);
                }
                let mut payload = Vec::with_capacity(bytes.len() + 1);
                payload.extend_from_slice(bytes);
                payload.push(0);
                payload
            }
            None => Vec::new(),
        };

        let mut header = PacketHeader::control(FrameType::Start, self.next_seq(), 0);
        header.payload_size = payload.len() as u16;
        self.emit(&header, &payload)?;
        info!(?url, "sent media start request");
        Ok(())
    }

    /// Asks the sender to stop media transmission.
    pub fn stop(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(ErrorKind::NotReady);
        }
        let header = PacketHeader::control(FrameType::Stop, self.next_seq(), 0);
        self.emit(&header, &[])?;
        info!("sent media stop request");
        Ok(())
    }

    /// Sends DISCONNECT to the sender (if connected) and closes the
    /// endpoint.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        let was_connected = *state == ConnectionState::Connected;
        *state = ConnectionState::Closed;
        drop(state);

        if was_connected {
            let header = PacketHeader::control(FrameType::Disconnect, self.next_seq(), 0);
            let _ = self.emit(&header, &[]);
            info!("connection closed");
            if let Some(callback) = self.connect_fn.lock().as_mut() {
                callback(false);
            }
        }
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

    fn emit(&self, header: &PacketHeader, payload: &[u8]) -> Result<()> {
        let mut buf = header.serialize();
        checksum::compute_and_set(&mut buf, payload);

        if !self.interceptor.lock().on_send(&self.server, &buf, payload) {
            trace!(seq = header.seq_num, "outgoing packet dropped by interceptor");
            return Ok(());
        }

        match self.channel.send_to(self.server, &buf, payload) {
            Ok(_) => Ok(()),
            Err(err) => Err(ErrorKind::from_send(&err)),
        }
    }

    fn send_ack(&self, frame_id: u16) {
        let header = PacketHeader::control(FrameType::Ack, self.next_seq(), frame_id);
        if let Err(err) = self.emit(&header, &[]) {
            debug!(%err, frame_id, "failed to send ack");
        }
    }

    /// Acknowledges one media fragment, echoing its fragment index so
    /// the sender can clear the matching retransmission slot.
    fn send_fragment_ack(&self, frame_id: u16, frag_index: u16) {
        let mut header = PacketHeader::control(FrameType::Ack, self.next_seq(), frame_id);
        header.frag_index = frag_index;
        if let Err(err) = self.emit(&header, &[]) {
            debug!(%err, frame_id, frag_index, "failed to send fragment ack");
        }
    }

    fn recv_once(&self, buf: &mut [u8]) -> Result<bool> {
        match self.channel.recv_from(buf) {
            Ok((len, from)) => {
                if !self.interceptor.lock().on_receive(&from, &buf[..len]) {
                    trace!("incoming packet dropped by interceptor");
                    return Ok(false);
                }
                self.process_datagram(&buf[..len], Instant::now());
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
            Err(err) => {
                warn!(%err, "socket receive failed");
                Err(ErrorKind::SocketRecv)
            }
        }
    }

    fn process_datagram(&self, data: &[u8], now: Instant) {
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
            self.stats.lock().checksum_errors += 1;
            return;
        }
        if !header.validate(self.config.mtu) {
            debug!(seq = header.seq_num, "invalid header");
            return;
        }

        self.track_sequence(header.seq_num);

        if header.frame_type.is_media() {
            self.handle_fragment(&header, payload, now);
            return;
        }
        match header.frame_type {
            FrameType::Ack => self.handle_ack(&header, now),
            FrameType::Connected => self.handle_connected(now),
            FrameType::Disconnect => self.handle_disconnect(),
            FrameType::User => self.handle_user(&header, payload),
            other => warn!(frame_type = ?other, "unexpected frame type at receiver"),
        }
    }

    fn track_sequence(&self, seq_num: u32) {
        let last = self.last_recv_seq.load(Ordering::Relaxed);
        if last > 0 && seq_num > last + 1 {
            let lost = u64::from(seq_num - last - 1);
            self.stats.lock().lost_packets += lost;
        }
        self.last_recv_seq.store(seq_num, Ordering::Relaxed);
    }

    fn handle_ack(&self, header: &PacketHeader, now: Instant) {
        *self.last_ack_recv.lock() = Some(now);
        if header.frame_id == 0 {
            return;
        }
        if let Some(frame) = self.data_queue.remove(header.frame_id) {
            trace!(frame_id = frame.frame_id, "reliable datagram acknowledged");
        }
    }

    fn handle_connected(&self, now: Instant) {
        // Always acknowledge: the reply is retransmitted until this ACK
        // lands.
        self.send_ack(0);

        let mut state = self.state.lock();
        if *state == ConnectionState::Connected || *state == ConnectionState::Closed {
            return;
        }
        *state = ConnectionState::Connected;
        drop(state);

        self.handshake.lock().reset();
        *self.last_ack_recv.lock() = Some(now);
        *self.last_heartbeat_sent.lock() = Some(now);
        info!(server = %self.server, "connected");
        if let Some(callback) = self.connect_fn.lock().as_mut() {
            callback(true);
        }
    }

    fn handle_disconnect(&self) {
        info!("sender disconnected");
        self.send_ack(0);
        *self.state.lock() = ConnectionState::Idle;
        if let Some(callback) = self.connect_fn.lock().as_mut() {
            callback(false);
        }
    }

    fn handle_user(&self, header: &PacketHeader, payload: &[u8]) {
        self.send_ack(header.frame_id);
        if let Some(callback) = self.data_fn.lock().as_mut() {
            callback(FrameType::User, payload);
        }
    }

    fn handle_fragment(&self, header: &PacketHeader, payload: &[u8], now: Instant) {
        let mtu = self.config.mtu;

        if !self.recv_queue.contains(header.frame_id) {
            let tracker = match self.frag_pool.acquire(header.total_frags) {
                Ok(tracker) => tracker,
                Err(err) => {
                    warn!(%err, total_frags = header.total_frags, "cannot track frame, dropping fragment");
                    self.stats.lock().alloc_failures += 1;
                    return;
                }
            };
            let mut frame = self.media_pool.acquire();
            frame.init_recv(header.frame_id, header.frame_type, header.total_frags, tracker, now);
            self.recv_queue.push(frame);
        }

        let outcome = self.recv_queue.with_mut(header.frame_id, |frame| {
            // The first fragment fixes the frame's fragment count; later
            // packets must agree with it.
            if header.frag_index >= frame.total_frags {
                return FragOutcome::Overflow;
            }
            let already = frame
                .tracker
                .as_ref()
                .map_or(true, |tracker| tracker.is_marked(header.frag_index));
            if already {
                return FragOutcome::Duplicate;
            }

            let offset = fragment::fragment_offset(header.frag_index, mtu);
            if frame.write_at(offset, payload).is_err() {
                return FragOutcome::Overflow;
            }
            if let Some(tracker) = frame.tracker.as_mut() {
                tracker.mark(header.frag_index);
            }
            frame.recv_frags += 1;
            frame.last_recv = Some(now);
            FragOutcome::Stored { complete: frame.is_complete() }
        });

        let outcome = match outcome {
            Some(outcome) => outcome,
            None => return,
        };
        match outcome {
            FragOutcome::Duplicate => {
                self.stats.lock().dup_packets += 1;
                // Re-acknowledge keyframe fragments: the duplicate means
                // our previous ack was lost.
                if header.frame_type.needs_fragment_ack() {
                    self.send_fragment_ack(header.frame_id, header.frag_index);
                }
            }
            FragOutcome::Overflow => {
                warn!(
                    frame_id = header.frame_id,
                    frag = header.frag_index,
                    len = payload.len(),
                    "fragment outside frame bounds"
                );
            }
            FragOutcome::Stored { complete } => {
                self.send_fragment_ack(header.frame_id, header.frag_index);
                {
                    let mut stats = self.stats.lock();
                    stats.total_packets += 1;
                    stats.total_bytes += payload.len() as u64;
                }
                if complete {
                    self.deliver_complete(header.frame_id);
                }
            }
        }
    }

    fn deliver_complete(&self, frame_id: u16) {
        let mut frame = match self.recv_queue.remove(frame_id) {
            Some(frame) => frame,
            None => return,
        };
        frame.state = FrameState::Complete;
        debug!(frame_id, len = frame.len(), frame_type = ?frame.frame_type, "frame complete");

        {
            let mut stats = self.stats.lock();
            stats.total_frames += 1;
            match frame.frame_type {
                FrameType::I => stats.total_i_frames += 1,
                FrameType::P => stats.total_p_frames += 1,
                _ => {}
            }
        }

        {
            let mut callback = self.frame_fn.lock();
            (*callback)(frame.payload(), frame.frame_type);
        }

        if frame.frame_type == FrameType::I {
            let previous = self.last_iframe.lock().replace(frame);
            drop(previous);
        }
    }

    fn run_timers(&self, now: Instant) {
        self.sweep_data_queue(now);
        self.sweep_recv_queue(now);
        self.sweep_handshake(now);
        self.send_heartbeat(now);
        self.check_liveness(now);
    }

    fn sweep_data_queue(&self, now: Instant) {
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
                let _ = self.emit(&header, frame.payload());
            }
            true
        });

        for frame in &expired {
            warn!(
                frame_id = frame.frame_id,
                retrans = frame.retrans_count,
                "reliable datagram dropped after exhausting retries"
            );
        }
    }

    fn sweep_recv_queue(&self, now: Instant) {
        let reaped = self.recv_queue.sweep(now);
        if reaped.is_empty() {
            return;
        }
        self.stats.lock().incomplete_frames += reaped.len() as u64;
        for frame in &reaped {
            let missing = frame.tracker.as_ref().map_or(0, |tracker| tracker.missing().count());
            debug!(
                frame_id = frame.frame_id,
                frame_type = ?frame.frame_type,
                missing,
                "reaped incomplete frame"
            );
        }
    }

    fn sweep_handshake(&self, now: Instant) {
        if *self.state.lock() != ConnectionState::HandshakeSent {
            return;
        }
        let mut handshake = self.handshake.lock();
        let sent = match handshake.send_time {
            Some(sent) => sent,
            None => return,
        };
        if handshake.retrans_count >= self.config.connect_max_retrans {
            warn!("handshake failed: connect retries exhausted");
            handshake.reset();
            drop(handshake);
            *self.state.lock() = ConnectionState::Idle;
            if let Some(callback) = self.connect_fn.lock().as_mut() {
                callback(false);
            }
            return;
        }
        if now.duration_since(sent) >= self.config.connect_retrans_timeout {
            handshake.retrans_count += 1;
            handshake.send_time = Some(now);
            let count = handshake.retrans_count;
            drop(handshake);

            let mut header = PacketHeader::control(FrameType::Connect, self.next_seq(), 0);
            header.set_retrans();
            debug!(count, "retransmitting connection request");
            let _ = self.emit(&header, &[]);
        }
    }

    fn send_heartbeat(&self, now: Instant) {
        if *self.state.lock() != ConnectionState::Connected {
            return;
        }
        let mut last_sent = self.last_heartbeat_sent.lock();
        let due = last_sent
            .map_or(true, |sent| now.duration_since(sent) >= self.config.heartbeat_interval);
        if !due {
            return;
        }
        *last_sent = Some(now);
        drop(last_sent);

        let header = PacketHeader::control(FrameType::Heartbeat, self.next_seq(), 0);
        trace!("heartbeat");
        let _ = self.emit(&header, &[]);
    }

    fn check_liveness(&self, now: Instant) {
        if *self.state.lock() != ConnectionState::Connected {
            return;
        }
        let mut last_guard = self.last_ack_recv.lock();
        let last = match *last_guard {
            Some(last) => last,
            None => return,
        };
        if now.duration_since(last) >= self.config.liveness_window() {
            warn!(
                max_miss = self.config.heartbeat_max_miss,
                "no acknowledgments from sender, declaring connection dead"
            );
            *last_guard = None;
            drop(last_guard);
            *self.state.lock() = ConnectionState::Idle;
            self.handshake.lock().reset();
            if let Some(callback) = self.connect_fn.lock().as_mut() {
                callback(false);
            }
        }
    }
}

impl Drop for VideoRx {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = self.close();
        drop(self.recv_queue.drain());
        drop(self.data_queue.drain());
        drop(self.last_iframe.lock().take());
    }
}

impl std::fmt::Debug for VideoRx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoRx")
            .field("server", &self.server)
            .field("state", &self.connection_state())
            .field("reassembling", &self.recv_queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_rx() -> VideoRx {
        VideoRx::new("127.0.0.1:9", Config::default(), Box::new(|_, _| {})).unwrap()
    }

    #[test]
    fn test_send_requires_connection() {
        let rx = bound_rx();
        assert_eq!(rx.send(b"hello").unwrap_err(), ErrorKind::NotReady);
        assert_eq!(rx.start(None).unwrap_err(), ErrorKind::NotReady);
        assert_eq!(rx.stop().unwrap_err(), ErrorKind::NotReady);
    }

    #[test]
    fn test_rejects_unresolvable_server() {
        let result = VideoRx::new("", Config::default(), Box::new(|_, _| {}));
        assert!(result.is_err());
    }

    #[test]
    fn test_connect_enters_handshake() {
        let rx = bound_rx();
        rx.connect().unwrap();
        assert_eq!(rx.connection_state(), ConnectionState::HandshakeSent);
        assert!(rx.connection_state().is_handshaking());
    }

    #[test]
    fn test_handshake_gives_up_after_budget() {
        let mut config = Config::default();
        config.connect_retrans_timeout = Duration::from_millis(5);
        config.connect_max_retrans = 2;
        // Port 9 (discard) swallows the CONNECT packets.
        let rx = VideoRx::new("127.0.0.1:9", config, Box::new(|_, _| {})).unwrap();
        rx.connect().unwrap();

        let deadline = Instant::now() + Duration::from_millis(500);
        while rx.connection_state().is_handshaking() && Instant::now() < deadline {
            // Nothing listens on the far side; ignore ICMP-induced
            // receive errors.
            let _ = rx.poll(Duration::from_millis(2));
        }
        assert_eq!(rx.connection_state(), ConnectionState::Idle);
    }

    #[test]
    fn test_frame_id_skips_zero() {
        let rx = bound_rx();
        rx.frame_id.store(u16::MAX, Ordering::Relaxed);
        assert_eq!(rx.next_frame_id(), u16::MAX);
        assert_eq!(rx.next_frame_id(), 1);
    }

    #[test]
    fn test_sequence_gap_tracking() {
        let rx = bound_rx();
        rx.track_sequence(1);
        rx.track_sequence(2);
        assert_eq!(rx.stats().lost_packets, 0);
        rx.track_sequence(7);
        assert_eq!(rx.stats().lost_packets, 4);
    }
}

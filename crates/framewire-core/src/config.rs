use std::time::Duration;

use crate::constants::{
    CTRL_FRAME_SIZE, CTRL_POOL_INIT, DEFAULT_MTU, DEFAULT_RECV_BUF, DEFAULT_SEND_BUF,
    MAX_FRAME_SIZE, MAX_URL_SIZE, MEDIA_POOL_INIT,
};

/// Configuration options shared by both transport endpoints.
///
/// Each endpoint takes a snapshot at construction; later mutation has no
/// effect on a live endpoint.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum packet size the transport will emit (header + payload).
    pub mtu: u16,
    /// Socket send buffer size in bytes (SO_SNDBUF).
    pub send_buffer_size: usize,
    /// Socket receive buffer size in bytes (SO_RCVBUF).
    pub recv_buffer_size: usize,
    /// Retransmit timeout for unacknowledged I-frame fragments.
    pub iframe_retrans_timeout: Duration,
    /// Retransmission budget per I-frame fragment.
    pub iframe_max_retrans: u8,
    /// Retransmit timeout for reliable user datagrams.
    pub data_retrans_timeout: Duration,
    /// Retransmission budget per reliable user datagram.
    pub data_max_retrans: u8,
    /// Retransmit timeout for the CONNECTED handshake reply (and for the
    /// receiver's CONNECT retries).
    pub connect_retrans_timeout: Duration,
    /// Retransmission budget for the handshake.
    pub connect_max_retrans: u8,
    /// Interval at which the receiver emits heartbeats once connected.
    pub heartbeat_interval: Duration,
    /// Consecutive missed heartbeats before the connection is declared dead.
    pub heartbeat_max_miss: u8,
    /// Age limit for a partially reassembled frame before it is reaped.
    pub frame_timeout: Duration,
    /// Payload capacity of a media frame.
    pub media_frame_capacity: usize,
    /// Payload capacity of a control frame (also the reliable datagram limit).
    pub control_frame_capacity: usize,
    /// Frames preallocated in the media pool.
    pub media_pool_size: usize,
    /// Frames preallocated in the control pool.
    pub control_pool_size: usize,
    /// Maximum START URL length, null terminator included.
    pub max_url_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mtu: DEFAULT_MTU,
            send_buffer_size: DEFAULT_SEND_BUF,
            recv_buffer_size: DEFAULT_RECV_BUF,
            iframe_retrans_timeout: Duration::from_millis(5),
            iframe_max_retrans: 3,
            data_retrans_timeout: Duration::from_millis(30),
            data_max_retrans: 3,
            connect_retrans_timeout: Duration::from_millis(100),
            connect_max_retrans: 3,
            heartbeat_interval: Duration::from_secs(60),
            heartbeat_max_miss: 3,
            frame_timeout: Duration::from_millis(100),
            media_frame_capacity: MAX_FRAME_SIZE,
            control_frame_capacity: CTRL_FRAME_SIZE,
            media_pool_size: MEDIA_POOL_INIT,
            control_pool_size: CTRL_POOL_INIT,
            max_url_len: MAX_URL_SIZE,
        }
    }
}

impl Config {
    /// The window after which a silent peer is declared dead.
    pub fn liveness_window(&self) -> Duration {
        self.heartbeat_interval * u32::from(self.heartbeat_max_miss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_contract() {
        let config = Config::default();
        assert_eq!(config.mtu, 1400);
        assert_eq!(config.send_buffer_size, 2 * 1024 * 1024);
        assert_eq!(config.recv_buffer_size, 2 * 1024 * 1024);
        assert_eq!(config.iframe_retrans_timeout, Duration::from_millis(5));
        assert_eq!(config.iframe_max_retrans, 3);
        assert_eq!(config.data_retrans_timeout, Duration::from_millis(30));
        assert_eq!(config.connect_retrans_timeout, Duration::from_millis(100));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert_eq!(config.frame_timeout, Duration::from_millis(100));
        assert_eq!(config.media_frame_capacity, 512 * 1024);
        assert_eq!(config.control_frame_capacity, 128);
        assert_eq!(config.max_url_len, 100);
    }

    #[test]
    fn test_liveness_window() {
        let mut config = Config::default();
        config.heartbeat_interval = Duration::from_millis(40);
        config.heartbeat_max_miss = 3;
        assert_eq!(config.liveness_window(), Duration::from_millis(120));
    }
}

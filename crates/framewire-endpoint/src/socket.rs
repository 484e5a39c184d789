use std::{
    io::{self, IoSlice},
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
};

use socket2::{SockAddr, Socket as Socket2};
use tracing::warn;

use framewire_core::error::{ErrorKind, Result};

/// Non-blocking UDP socket with sized kernel buffers and scatter-gather
/// sends.
///
/// Packets are written as two segments (serialized header, payload) so
/// the payload is never copied into a contiguous staging buffer.
pub(crate) struct UdpChannel {
    socket: UdpSocket,
    raw: Socket2,
}

impl UdpChannel {
    pub fn bind(addr: impl ToSocketAddrs, send_buf: usize, recv_buf: usize) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|_| ErrorKind::SocketBind)?;
        socket.set_nonblocking(true).map_err(|_| ErrorKind::SocketCreate)?;

        let raw = Socket2::from(socket.try_clone().map_err(|_| ErrorKind::SocketCreate)?);
        if send_buf > 0 {
            if let Err(err) = raw.set_send_buffer_size(send_buf) {
                warn!(%err, send_buf, "failed to size socket send buffer");
            }
        }
        if recv_buf > 0 {
            if let Err(err) = raw.set_recv_buffer_size(recv_buf) {
                warn!(%err, recv_buf, "failed to size socket receive buffer");
            }
        }

        Ok(Self { socket, raw })
    }

    pub fn send_to(&self, addr: SocketAddr, header: &[u8], payload: &[u8]) -> io::Result<usize> {
        let target = SockAddr::from(addr);
        if payload.is_empty() {
            self.raw.send_to_vectored(&[IoSlice::new(header)], &target)
        } else {
            self.raw
                .send_to_vectored(&[IoSlice::new(header), IoSlice::new(payload)], &target)
        }
    }

    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl std::fmt::Debug for UdpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpChannel").field("local_addr", &self.socket.local_addr().ok()).finish()
    }
}

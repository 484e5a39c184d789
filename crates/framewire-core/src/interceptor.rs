//! Packet interception for loss injection and inspection.

use std::net::SocketAddr;

/// Observes packets crossing the socket boundary and decides whether
/// they proceed.
///
/// Returning `false` from either hook silently drops the packet — the
/// transport behaves exactly as if the network had lost it. The loss
/// scenarios in the integration suite are built on this.
pub trait Interceptor: Send {
    /// Called before a packet is written to the socket. `header` is the
    /// serialized header (checksum included); `payload` may be empty.
    fn on_send(&mut self, addr: &SocketAddr, header: &[u8], payload: &[u8]) -> bool {
        let _ = (addr, header, payload);
        true
    }

    /// Called for each received datagram before any parsing.
    fn on_receive(&mut self, addr: &SocketAddr, datagram: &[u8]) -> bool {
        let _ = (addr, datagram);
        true
    }
}

/// Interceptor that passes everything through untouched.
#[derive(Debug, Default)]
pub struct NoOpInterceptor;

impl Interceptor for NoOpInterceptor {}

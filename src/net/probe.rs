use std::net::{Ipv6Addr, SocketAddrV6};

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

/// Pre-built ICMPv6 echo request: type 128, code 0, zeroed checksum (the
/// kernel fills it in for ICMPv6 sockets), identifier 0xDEAD, sequence 1.
/// Every probe sends these same eight bytes; the pixel data lives entirely
/// in the destination address.
pub const ECHO_REQUEST: [u8; 8] = [0x80, 0x00, 0x00, 0x00, 0xde, 0xad, 0x00, 0x01];

/// Fire-and-forget ping sender. One per worker; replies are never read.
pub struct ProbeSocket {
    socket: Socket,
}

impl ProbeSocket {
    /// Opens an unprivileged ICMPv6 datagram socket. Failure here is fatal
    /// for the whole process since every worker uses the same configuration.
    pub fn open() -> Result<Self> {
        let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::ICMPV6))
            .context("open ping socket")?;
        socket
            .set_nonblocking(true)
            .context("set ping socket non-blocking")?;
        Ok(Self { socket })
    }

    /// Sends one echo request to `addr`. A `WouldBlock` from a saturated
    /// send buffer counts as a dropped probe, not an error: there is no
    /// delivery guarantee to uphold.
    pub fn send(&self, addr: Ipv6Addr) -> std::io::Result<()> {
        let dst = SockAddr::from(SocketAddrV6::new(addr, 0, 0, 0));
        match self.socket.send_to(&ECHO_REQUEST, &dst) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_request_header_fields() {
        assert_eq!(ECHO_REQUEST.len(), 8);
        assert_eq!(ECHO_REQUEST[0], 128); // echo request
        assert_eq!(ECHO_REQUEST[1], 0); // code
        assert_eq!(&ECHO_REQUEST[2..4], &[0, 0]); // checksum left to the kernel
        assert_eq!(u16::from_be_bytes([ECHO_REQUEST[4], ECHO_REQUEST[5]]), 0xdead);
        assert_eq!(u16::from_be_bytes([ECHO_REQUEST[6], ECHO_REQUEST[7]]), 1);
    }
}

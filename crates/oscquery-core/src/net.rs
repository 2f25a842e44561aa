//! Port helpers

use std::io;
use std::net::{Ipv4Addr, TcpListener, UdpSocket};

/// A TCP port on loopback that was free at the time of the call
pub fn available_tcp_port() -> io::Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

/// A UDP port on loopback that was free at the time of the call
pub fn available_udp_port() -> io::Result<u16> {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(socket.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_are_nonzero() {
        assert_ne!(available_tcp_port().unwrap(), 0);
        assert_ne!(available_udp_port().unwrap(), 0);
    }
}

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
};

#[cfg(target_os = "linux")]
use std::os::unix::net::UnixDatagram;

use super::{RemoteAddr, Transport};

/// A connected datagram socket.
///
/// The remote address is resolved and connected to once, when the transport is created. There is no reconnect logic:
/// if the remote end goes away, sends simply start failing.
#[derive(Debug)]
pub(crate) enum SocketTransport {
    Udp(UdpSocket),

    #[cfg(target_os = "linux")]
    Unixgram(UnixDatagram),
}

impl SocketTransport {
    /// Creates a socket connected to the given remote address.
    pub fn connect(remote_addr: &RemoteAddr) -> io::Result<Self> {
        match remote_addr {
            RemoteAddr::Udp(addrs) => {
                // Bind to the same address family as the remote address, otherwise connecting will fail.
                let bind_addr: SocketAddr = if addrs.first().is_some_and(SocketAddr::is_ipv6) {
                    (Ipv6Addr::UNSPECIFIED, 0).into()
                } else {
                    (Ipv4Addr::UNSPECIFIED, 0).into()
                };

                UdpSocket::bind(bind_addr).and_then(|socket| {
                    socket.connect(&addrs[..])?;
                    Ok(SocketTransport::Udp(socket))
                })
            }

            #[cfg(target_os = "linux")]
            RemoteAddr::Unixgram(path) => UnixDatagram::unbound().and_then(|socket| {
                socket.connect(path)?;
                Ok(SocketTransport::Unixgram(socket))
            }),
        }
    }
}

impl Transport for SocketTransport {
    fn send(&self, payload: &[u8]) -> io::Result<usize> {
        match self {
            SocketTransport::Udp(socket) => socket.send(payload),

            #[cfg(target_os = "linux")]
            SocketTransport::Unixgram(socket) => socket.send(payload),
        }
    }
}

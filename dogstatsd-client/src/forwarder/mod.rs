use std::{
    io,
    net::{SocketAddr, ToSocketAddrs as _},
    sync::Arc,
};

#[cfg(target_os = "linux")]
use std::path::PathBuf;

mod socket;
pub(crate) use self::socket::SocketTransport;

/// A datagram transport that payloads are written to.
///
/// Each call to [`send`][Transport::send] carries exactly one complete metric or event payload, and is expected to be
/// delivered as a single datagram. Delivery is best effort: the client never retries, and never waits for any sort of
/// acknowledgement.
///
/// Transports are shared across threads and written to through a shared reference. Implementations must tolerate
/// concurrent calls to `send`, either because the underlying socket writes each datagram atomically (as UDP and Unix
/// datagram sockets do) or by serializing writes internally.
pub trait Transport: Send + Sync {
    /// Sends a single payload, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// If the payload could not be written, an error is returned.
    fn send(&self, payload: &[u8]) -> io::Result<usize>;
}

impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    fn send(&self, payload: &[u8]) -> io::Result<usize> {
        (**self).send(payload)
    }
}

impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    fn send(&self, payload: &[u8]) -> io::Result<usize> {
        (**self).send(payload)
    }
}

/// A transport that discards every payload.
///
/// Useful for disabling metric collection entirely, or for benchmarking.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopTransport;

impl Transport for NopTransport {
    fn send(&self, _payload: &[u8]) -> io::Result<usize> {
        Ok(0)
    }
}

#[derive(Clone, Debug)]
pub(crate) enum RemoteAddr {
    Udp(Vec<SocketAddr>),

    #[cfg(target_os = "linux")]
    Unixgram(PathBuf),
}

impl RemoteAddr {
    /// Returns the transport ID for the remote address.
    ///
    /// This is a simple acronym related to the transport that will be used for the remote address, such as `udp` for
    /// UDP, and so on.
    pub const fn transport_id(&self) -> &'static str {
        match self {
            RemoteAddr::Udp(_) => "udp",
            #[cfg(target_os = "linux")]
            RemoteAddr::Unixgram(_) => "uds",
        }
    }
}

impl<'a> TryFrom<&'a str> for RemoteAddr {
    type Error = String;

    fn try_from(addr: &'a str) -> Result<Self, Self::Error> {
        if let Some((scheme, path)) = addr.split_once("://") {
            return match scheme {
                #[cfg(target_os = "linux")]
                "unixgram" => Ok(RemoteAddr::Unixgram(PathBuf::from(path))),
                #[cfg(target_os = "linux")]
                _ => Err(format!("invalid scheme '{scheme}' (expected 'unixgram')")),
                #[cfg(not(target_os = "linux"))]
                _ => Err(format!("invalid scheme '{scheme}' for path '{path}' (only UDP is supported)")),
            };
        }

        match addr.to_socket_addrs() {
            Ok(addrs) => {
                let addrs: Vec<_> = addrs.collect();
                if addrs.is_empty() {
                    Err(format!("'{addr}' did not resolve to any addresses"))
                } else {
                    Ok(RemoteAddr::Udp(addrs))
                }
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

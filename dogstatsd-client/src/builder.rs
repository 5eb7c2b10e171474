use std::{io, net::SocketAddr, sync::Arc};

use thiserror::Error;
use tracing::debug;

use crate::{
    client::DogStatsDClient,
    forwarder::{RemoteAddr, SocketTransport, Transport},
    recorder::DogStatsDRecorder,
};

/// Errors that could occur while building or installing a DogStatsD client.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to parse the remote address.
    #[error("invalid remote address: {reason}")]
    InvalidRemoteAddress {
        /// Details about the parsing failure.
        reason: String,
    },

    /// Failed to create or connect the socket for the remote address.
    #[error("failed to connect to remote address: {0}")]
    Connect(#[source] io::Error),

    /// Failed to install the recorder due to an existing global recorder already being installed.
    #[error("failed to install recorder as global recorder")]
    FailedToInstall,
}

/// Builder for a DogStatsD client.
pub struct DogStatsDBuilder {
    remote_addr: RemoteAddr,
    transport: Option<Box<dyn Transport>>,
    namespace: String,
    global_tags: Vec<String>,
}

impl DogStatsDBuilder {
    /// Set the remote address to send metrics and events to.
    ///
    /// For UDP, the address simply needs to be in the format of `<host>:<port>`, and is resolved once, when this method
    /// is called. On Linux, a Unix datagram socket (`SOCK_DGRAM`) can be used instead with an address in the format of
    /// `unixgram://<path>`.
    ///
    /// Defaults to sending to `127.0.0.1:8125` over UDP.
    ///
    /// # Errors
    ///
    /// If the given address is not able to be parsed as a valid address, an error will be returned indicating the
    /// reason.
    pub fn with_remote_address<A>(mut self, addr: A) -> Result<Self, BuildError>
    where
        A: AsRef<str>,
    {
        self.remote_addr = RemoteAddr::try_from(addr.as_ref())
            .map_err(|reason| BuildError::InvalidRemoteAddress { reason })?;
        Ok(self)
    }

    /// Use a custom transport for sending payloads.
    ///
    /// When set, the remote address is ignored and no socket is created.
    #[must_use]
    pub fn with_transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Set the namespace prepended to every metric name.
    ///
    /// The namespace is prepended as-is, so it should include its own trailing separator, such as `"myapp."`. The part
    /// of the namespace before the first `.` is also used as the default source type name for events.
    ///
    /// Defaults to no namespace.
    #[must_use]
    pub fn with_namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the tags added to every metric and event.
    ///
    /// Global tags are written after any tags given for the specific metric or event.
    ///
    /// Defaults to no global tags.
    #[must_use]
    pub fn with_global_tags<I, S>(mut self, global_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_tags = global_tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// If a socket for the remote address cannot be created or connected, an error will be returned.
    pub fn build(self) -> Result<DogStatsDClient, BuildError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let socket =
                    SocketTransport::connect(&self.remote_addr).map_err(BuildError::Connect)?;
                debug!(
                    transport = self.remote_addr.transport_id(),
                    remote_addr = ?self.remote_addr,
                    "Connected DogStatsD client."
                );
                Box::new(socket)
            }
        };

        Ok(DogStatsDClient::new(transport, self.namespace, self.global_tags))
    }

    /// Builds a recorder that forwards `metrics` updates through a new client.
    ///
    /// The recorder must be manually installed by the caller.
    ///
    /// # Errors
    ///
    /// If a socket for the remote address cannot be created or connected, an error will be returned.
    pub fn build_recorder(self) -> Result<DogStatsDRecorder, BuildError> {
        self.build().map(|client| DogStatsDRecorder::new(Arc::new(client)))
    }

    /// Builds a recorder and installs it as the global recorder.
    ///
    /// The client backing the recorder is returned, so that it can still be used directly, such as for sending events.
    ///
    /// # Errors
    ///
    /// If a socket for the remote address cannot be created or connected, or if a global recorder is already
    /// installed, an error will be returned.
    pub fn install(self) -> Result<Arc<DogStatsDClient>, BuildError> {
        let recorder = self.build_recorder()?;
        let client = Arc::clone(recorder.client());

        metrics::set_global_recorder(recorder).map_err(|_| BuildError::FailedToInstall)?;
        Ok(client)
    }
}

impl Default for DogStatsDBuilder {
    fn default() -> Self {
        DogStatsDBuilder {
            remote_addr: RemoteAddr::Udp(vec![SocketAddr::from(([127, 0, 0, 1], 8125))]),
            transport: None,
            namespace: String::new(),
            global_tags: Vec::new(),
        }
    }
}

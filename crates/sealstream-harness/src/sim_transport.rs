//! Turmoil-backed transport.
//!
//! Streams are turmoil's simulated TCP, so latency, loss (absorbed by the
//! simulated TCP) and partitions come from the simulation builder while the
//! secure socket code under test stays unchanged.

use std::io;

use async_trait::async_trait;
use sealstream_core::Transport;
use tracing::debug;
use turmoil::net::{TcpListener, TcpStream};

/// Simulated transport for use inside a turmoil host or client.
pub struct SimTransport {
    listener: Option<TcpListener>,
}

impl std::fmt::Debug for SimTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimTransport")
            .field("listening", &self.listener.is_some())
            .finish()
    }
}

impl SimTransport {
    /// Bind a listener inside the current simulated host.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that only connects out.
    pub fn client() -> Self {
        Self { listener: None }
    }

    /// Connect to `addr` (`host:port`) and return the raw stream.
    pub async fn connect_to(addr: &str) -> io::Result<TcpStream> {
        Self::client().connect(addr).await
    }
}

#[async_trait]
impl Transport for SimTransport {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<TcpStream> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not bound"))?;

        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "accepted simulated connection");
        Ok(stream)
    }

    async fn connect(&self, remote: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(remote).await?;
        debug!(remote, "connected simulated stream");
        Ok(stream)
    }
}

//! Transport abstraction for stream-oriented connections.
//!
//! The secure socket only needs a reliable, ordered byte stream. Production
//! uses TCP ([`TcpTransport`]), tests use turmoil (simulated TCP).

use std::io;

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};
use tracing::debug;

/// Source of raw byte streams for secure sockets.
///
/// Streams must deliver bytes reliably and in order. The secure socket
/// detects loss or reordering but cannot recover from it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Raw bidirectional stream.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Accept an incoming connection.
    ///
    /// Blocks until a peer connects.
    async fn accept(&self) -> io::Result<Self::Stream>;

    /// Connect to `remote` (`host:port`).
    async fn connect(&self, remote: &str) -> io::Result<Self::Stream>;
}

/// TCP transport backed by tokio.
///
/// Created with [`TcpTransport::bind`] to accept, or [`TcpTransport::client`]
/// to only connect.
#[derive(Debug, Default)]
pub struct TcpTransport {
    listener: Option<TcpListener>,
}

impl TcpTransport {
    /// Bind a listener on `addr`.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        debug!(addr = %listener.local_addr()?, "listening");
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that can only connect out.
    pub fn client() -> Self {
        Self { listener: None }
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not bound"))?
            .local_addr()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<TcpStream> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not bound"))?;

        let (stream, peer) = listener.accept().await?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted connection");
        Ok(stream)
    }

    async fn connect(&self, remote: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(remote).await?;
        stream.set_nodelay(true)?;
        debug!(remote, "connected");
        Ok(stream)
    }
}

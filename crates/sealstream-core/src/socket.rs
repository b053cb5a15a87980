//! Secure stream socket.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────────┐  seal/open/framing error, failed send  ┌────────┐
//! │ Established │───────────────────────────────────────>│ Failed │
//! └─────────────┘                                        └────────┘
//!    │      ▲
//!    └──────┘ send / recv (each direction ratchets independently)
//! ```
//!
//! The socket is born `Established`: it is only constructed after a
//! handshake has produced its keys. `Failed` is terminal; every operation in
//! it returns `InvalidState` and the connection has to be re-handshaken.
//!
//! # Receive path
//!
//! `recv` first drains the receive buffer. Only when it is empty does the
//! socket read exactly one frame, open it, and buffer the plaintext. A call
//! with a small `max_len` therefore never loses data; the rest is served by
//! later calls without touching the stream.
//!
//! # Cancellation
//!
//! Partial frame progress lives in the socket's [`FrameReader`], not in the
//! future returned by [`SecureStreamSocket::recv_async`]. Dropping that future
//! (for example in a `select!` or on timeout) keeps the bytes already read,
//! and the next call resumes the same frame. Dropping the socket discards the
//! progress along with the stream.
//!
//! Errors from the raw stream while receiving leave the socket `Established`
//! with its progress intact, so a caller can retry after a timeout.

use std::io::{self, Read, Write};

use bytes::{Bytes, BytesMut};
use rand::{CryptoRng, RngCore};
use sealstream_crypto::{Direction, DirectionalState, SymmetricKey};
use sealstream_proto::{FrameReader, SealedLayout, encode_frame};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::{
    config::SocketConfig,
    error::{Result, SocketError},
    handshake::{AsyncHandshake, Handshake},
};

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Keys agreed, traffic flowing
    Established,
    /// Directional state lost; the connection must be torn down
    Failed,
}

/// Authenticated, encrypted, self-rekeying stream over a raw stream `S`.
///
/// `R` supplies the IV of every sealed package.
///
/// Blocking `send`/`recv` are available when `S` implements
/// [`std::io::Write`]/[`std::io::Read`]; `send_async`/`recv_async` when it
/// implements tokio's `AsyncWrite`/`AsyncRead`.
pub struct SecureStreamSocket<S, R> {
    stream: S,
    rng: R,
    config: SocketConfig,
    state: ConnectionState,
    outgoing: DirectionalState,
    incoming: DirectionalState,
    reader: FrameReader,
    buffer: BytesMut,
}

impl<S, R> std::fmt::Debug for SecureStreamSocket<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureStreamSocket")
            .field("state", &self.state)
            .field("send_counter", &self.outgoing.counter())
            .field("recv_counter", &self.incoming.counter())
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl<S, R: RngCore + CryptoRng> SecureStreamSocket<S, R> {
    /// Wrap `stream` using a handshake-provided key pair.
    ///
    /// Both directions start from the same `(secret_key, mask_key)` with
    /// counter 0.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` fails validation
    /// - `KeyMismatch` if either key differs from `config.key_size`
    pub fn new(
        secret_key: SymmetricKey,
        mask_key: SymmetricKey,
        stream: S,
        rng: R,
        config: SocketConfig,
    ) -> Result<Self> {
        config.validate()?;

        let expected = config.key_size.byte_len();
        let (secret, mask) = (secret_key.as_bytes().len(), mask_key.as_bytes().len());
        if secret != expected || mask != expected {
            return Err(SocketError::KeyMismatch { expected, secret, mask });
        }

        let outgoing = DirectionalState::new(
            Direction::Outgoing,
            secret_key.clone(),
            mask_key.clone(),
            config.block_size,
            config.rekey_limit,
        )?;
        let incoming = DirectionalState::new(
            Direction::Incoming,
            secret_key,
            mask_key,
            config.block_size,
            config.rekey_limit,
        )?;

        debug!(
            key_bits = config.key_size.bits(),
            block_size = config.block_size,
            rekey_limit = config.rekey_limit,
            "secure stream established"
        );

        Ok(Self {
            stream,
            rng,
            reader: FrameReader::new(config.max_frame_size),
            config,
            state: ConnectionState::Established,
            outgoing,
            incoming,
            buffer: BytesMut::new(),
        })
    }

    /// Run `handshake` to completion over `stream`, then wrap the stream.
    pub fn from_handshake<H: Handshake<S>>(
        mut handshake: H,
        mut stream: S,
        rng: R,
        config: SocketConfig,
    ) -> Result<Self> {
        handshake.run(&mut stream)?;
        let secret_key = handshake.secret_key()?.clone();
        let mask_key = handshake.mask_key()?.clone();
        Self::new(secret_key, mask_key, stream, rng, config)
    }

    /// Async twin of [`Self::from_handshake`].
    pub async fn from_handshake_async<H>(
        mut handshake: H,
        mut stream: S,
        rng: R,
        config: SocketConfig,
    ) -> Result<Self>
    where
        S: Send,
        H: AsyncHandshake<S>,
    {
        handshake.run(&mut stream).await?;
        let secret_key = handshake.secret_key()?.clone();
        let mask_key = handshake.mask_key()?.clone();
        Self::new(secret_key, mask_key, stream, rng, config)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Counter of the next outgoing message.
    pub fn send_counter(&self) -> u64 {
        self.outgoing.counter()
    }

    /// Counter of the next incoming message.
    pub fn recv_counter(&self) -> u64 {
        self.incoming.counter()
    }

    /// Number of outgoing rekeys so far.
    pub fn send_generation(&self) -> u64 {
        self.outgoing.generation()
    }

    /// Number of incoming rekeys so far.
    pub fn recv_generation(&self) -> u64 {
        self.incoming.generation()
    }

    /// Decrypted bytes waiting to be served by `recv`.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Configuration in use.
    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Borrow the raw stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the raw stream.
    ///
    /// Writing to or reading from it directly desynchronizes the peers.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Unwrap the raw stream, discarding key state and buffered plaintext.
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn ensure_established(&self, operation: &'static str) -> Result<()> {
        match self.state {
            ConnectionState::Established => Ok(()),
            state => Err(SocketError::InvalidState { state, operation }),
        }
    }

    /// Move to `Failed` and hand the error back.
    fn fail(&mut self, error: SocketError) -> SocketError {
        if self.state != ConnectionState::Failed {
            warn!(
                %error,
                send_counter = self.outgoing.counter(),
                recv_counter = self.incoming.counter(),
                "secure stream failed"
            );
            self.state = ConnectionState::Failed;
        }
        error
    }

    /// Seal `data` as the next outgoing message and frame it.
    ///
    /// Messages the peer's frame limit would reject are refused up front,
    /// leaving the ratchet and the state untouched.
    fn seal_frame(&mut self, data: &[u8]) -> Result<Bytes> {
        let max = self.config.max_frame_size;
        let frame_size = SealedLayout::compute(self.config.block_size, 0, 0, data.len())
            .ok()
            .and_then(|layout| u64::try_from(layout.total_size).ok())
            .unwrap_or(u64::MAX);
        if frame_size > max {
            return Err(SocketError::MessageTooLarge { len: data.len(), frame_size, max });
        }

        match self.outgoing.seal(data, &mut self.rng) {
            Ok(package) => Ok(encode_frame(package.as_bytes())),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Record `n` freshly read bytes. Returns a complete package if one
    /// finished.
    fn advance_reader(&mut self, n: usize) -> Result<Option<Bytes>> {
        self.reader.advance(n).map_err(|e| self.fail(e.into()))
    }

    /// Open `package` as the next incoming message into the buffer.
    fn open_into_buffer(&mut self, package: &[u8]) -> Result<()> {
        let data = self.incoming.open(package).map_err(|e| self.fail(e.into()))?;
        self.buffer.extend_from_slice(&data);
        Ok(())
    }

    fn take_buffered(&mut self, max_len: usize) -> Bytes {
        let n = max_len.min(self.buffer.len());
        self.buffer.split_to(n).freeze()
    }

    fn unexpected_eof(&self) -> SocketError {
        let message = format!(
            "stream closed with {} of {} frame bytes received",
            self.reader.bytes_received(),
            self.reader.target_size()
        );
        io::Error::new(io::ErrorKind::UnexpectedEof, message).into()
    }
}

impl<S: Write, R: RngCore + CryptoRng> SecureStreamSocket<S, R> {
    /// Seal `data` and write it as one frame.
    ///
    /// Returns `data.len()`: a send is all or nothing.
    ///
    /// # Errors
    ///
    /// `MessageTooLarge` if the sealed frame would exceed `max_frame_size`;
    /// the socket stays usable. Any other failure, including a failed write,
    /// moves the socket to `Failed`: the outgoing counter has already
    /// advanced and the peer may have seen part of the frame.
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_established("send")?;

        let frame = self.seal_frame(data)?;
        if let Err(e) = self.stream.write_all(&frame).and_then(|()| self.stream.flush()) {
            return Err(self.fail(e.into()));
        }

        trace!(len = data.len(), counter = self.outgoing.counter(), "sent");
        Ok(data.len())
    }
}

impl<S: Read, R: RngCore + CryptoRng> SecureStreamSocket<S, R> {
    /// Receive up to `max_len` plaintext bytes.
    ///
    /// Serves buffered plaintext first. With an empty buffer, blocks until one
    /// whole frame arrives, even when `max_len` is 0; the frame's plaintext is
    /// then buffered and `max_len` of it returned.
    ///
    /// # Errors
    ///
    /// Seal and framing errors move the socket to `Failed`. I/O errors are
    /// returned as is and keep partial frame progress.
    pub fn recv(&mut self, max_len: usize) -> Result<Bytes> {
        self.ensure_established("recv")?;

        if self.buffer.is_empty() {
            let package = self.read_frame()?;
            self.open_into_buffer(&package)?;
        }

        Ok(self.take_buffered(max_len))
    }

    fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            let n = match self.stream.read(self.reader.unfilled()) {
                Ok(0) => return Err(self.unexpected_eof()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if let Some(package) = self.advance_reader(n)? {
                return Ok(package);
            }
        }
    }
}

impl<S: AsyncWrite + Unpin, R: RngCore + CryptoRng> SecureStreamSocket<S, R> {
    /// Async twin of [`Self::send`].
    ///
    /// Oversized messages are refused with `MessageTooLarge` before sealing.
    ///
    /// Not cancel-safe: dropping the future mid-write leaves a partial frame
    /// on the stream. The socket is marked `Failed` only when the write
    /// reports an error, so callers must not abandon a pending send.
    pub async fn send_async(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_established("send_async")?;

        let frame = self.seal_frame(data)?;
        let written = async {
            self.stream.write_all(&frame).await?;
            self.stream.flush().await
        }
        .await;

        if let Err(e) = written {
            return Err(self.fail(e.into()));
        }

        trace!(len = data.len(), counter = self.outgoing.counter(), "sent");
        Ok(data.len())
    }
}

impl<S: AsyncRead + Unpin, R: RngCore + CryptoRng> SecureStreamSocket<S, R> {
    /// Async twin of [`Self::recv`].
    ///
    /// Returns buffered plaintext without touching the stream.
    ///
    /// Cancel-safe: dropping the future keeps partial frame progress.
    pub async fn recv_async(&mut self, max_len: usize) -> Result<Bytes> {
        self.ensure_established("recv_async")?;

        if self.buffer.is_empty() {
            let package = self.read_frame_async().await?;
            self.open_into_buffer(&package)?;
        }

        Ok(self.take_buffered(max_len))
    }

    /// Receive like [`Self::recv_async`] and hand the outcome to `callback`.
    ///
    /// `callback` runs exactly once, with the bytes or the error, unless the
    /// returned future is dropped first, in which case it never runs.
    pub async fn recv_async_with<F>(&mut self, max_len: usize, callback: F)
    where
        F: FnOnce(Result<Bytes>),
    {
        let result = self.recv_async(max_len).await;
        callback(result);
    }

    async fn read_frame_async(&mut self) -> Result<Bytes> {
        loop {
            let n = self.stream.read(self.reader.unfilled()).await?;
            if n == 0 {
                return Err(self.unexpected_eof());
            }

            if let Some(package) = self.advance_reader(n)? {
                return Ok(package);
            }
        }
    }
}

//! Socket and handshake error types.

use std::io;

use sealstream_crypto::SealError;
use sealstream_proto::ProtocolError;
use thiserror::Error;

use crate::socket::ConnectionState;

/// Errors surfaced by the secure stream socket.
#[derive(Debug, Error)]
pub enum SocketError {
    /// The underlying stream failed. Propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A package failed to seal or open.
    #[error(transparent)]
    Seal(#[from] SealError),

    /// The peer broke the stream framing.
    #[error("framing error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The handshake did not produce a usable key pair.
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// The sealed message would exceed the peer's frame limit. Nothing was
    /// sealed or written.
    #[error("message of {len} bytes seals to a {frame_size} byte frame, limit is {max}")]
    MessageTooLarge {
        /// Plaintext length passed to send
        len: usize,
        /// Length of the package it would seal to
        frame_size: u64,
        /// Configured `max_frame_size`
        max: u64,
    },

    /// Handshake keys do not match the configured key size.
    #[error("key size mismatch: expected {expected} bytes, got secret {secret} and mask {mask}")]
    KeyMismatch {
        /// Configured key length
        expected: usize,
        /// Secret key length supplied
        secret: usize,
        /// Mask key length supplied
        mask: usize,
    },

    /// Configuration rejected by [`SocketConfig::validate`].
    ///
    /// [`SocketConfig::validate`]: crate::SocketConfig::validate
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation not allowed in the current state.
    #[error("cannot {operation} in state {state:?}")]
    InvalidState {
        /// State the socket was in
        state: ConnectionState,
        /// Operation that was attempted
        operation: &'static str,
    },
}

impl SocketError {
    /// True for errors that leave the directional states unusable.
    ///
    /// Sealing, opening and framing errors mean the two peers no longer agree
    /// on the stream; there is no resynchronization.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Seal(_) | Self::Protocol(_))
    }
}

/// Errors produced while running a handshake.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Keys were requested before the handshake finished.
    #[error("handshake is not complete")]
    Incomplete,

    /// The raw stream failed during the handshake.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The handshake protocol rejected the peer.
    #[error("{0}")]
    Failed(String),
}

/// Result type for socket operations.
pub type Result<T> = std::result::Result<T, SocketError>;

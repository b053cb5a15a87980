//! Error types for sealing and opening packages.

use sealstream_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by the codec and the ratchet.
///
/// `SizeMismatch`, `AuthenticationFailure` and `TagMismatch` are fatal for a
/// connection: the peer sent something this side cannot account for, whether
/// through corruption, tampering or ratchet desynchronization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SealError {
    /// Declared sizes are inconsistent with the bytes present.
    #[error("size mismatch: {0}")]
    SizeMismatch(#[from] ProtocolError),

    /// AEAD tag did not verify.
    #[error("authentication failed: tag does not verify")]
    AuthenticationFailure,

    /// Package tag differs from the tag the caller pinned.
    #[error("package tag does not match the expected tag")]
    TagMismatch,

    /// Key is neither 128 nor 256 bits.
    #[error("invalid key length: expected 16 or 32 bytes, got {actual}")]
    InvalidKeyLength {
        /// Length supplied
        actual: usize,
    },

    /// AEAD refused to encrypt (plaintext beyond the GCM limit).
    #[error("encryption failed")]
    Encryption,

    /// HKDF could not produce the requested output length.
    #[error("key derivation failed")]
    KeyDerivation,
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, SealError>;

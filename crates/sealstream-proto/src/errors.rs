//! Error types for wire-format validation.

use thiserror::Error;

/// Errors raised while validating sealed-package sizes or stream frames.
///
/// Every variant is a local input-validation failure. None of them is
/// retryable: the bytes on the wire are inconsistent with what they declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Input is shorter than a fixed-size structure that must be present.
    #[error("package too short: need at least {expected} bytes, got {actual}")]
    PackageTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Header sizes do not exactly account for the package length.
    #[error("package size mismatch: header declares {declared} bytes, package has {actual}")]
    SizeMismatch {
        /// Length implied by the header (`44 + KeyMetaSize + PayloadSize`)
        declared: u64,
        /// Actual package length
        actual: usize,
    },

    /// Decrypted inner header claims more metadata/data than was decrypted.
    #[error("inner payload declares {declared} bytes but only {available} were decrypted")]
    InnerSizeMismatch {
        /// Length implied by the inner header (`16 + MetaSize + DataSize`)
        declared: u64,
        /// Decrypted payload length
        available: usize,
    },

    /// A declared or computed length does not fit the address space.
    #[error("length arithmetic overflow")]
    LengthOverflow,

    /// Block alignment size of zero.
    #[error("block size must be a positive number of bytes")]
    InvalidBlockSize,

    /// Stream frame larger than the configured limit.
    #[error("frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Length announced by the frame prefix
        size: u64,
        /// Configured maximum
        max: u64,
    },
}

/// Result type for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

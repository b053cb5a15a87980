//! Wire format for sealstream.
//!
//! A sealed package is a fixed 44-byte plaintext header, a variable-length key
//! metadata region, and one AEAD ciphertext whose plaintext carries its own
//! 16-byte inner header followed by metadata, data and zero padding. The whole
//! package is always a multiple of the codec's block size.
//!
//! ```text
//! 0        16       28             36             44              44+K
//! ┌────────┬────────┬──────────────┬──────────────┬───────────────┬──────────────────┐
//! │  Tag   │   IV   │ PayloadSize  │ KeyMetaSize  │ KeyMeta (K)   │ Ciphertext (P)   │
//! └────────┴────────┴──────────────┴──────────────┴───────────────┴──────────────────┘
//!          └──────────────── authenticated as AAD ─────────────────┘
//! ```
//!
//! On a stream, each package travels behind an 8-byte little-endian length
//! prefix (see [`frame`]).
//!
//! # Security
//!
//! All parsing uses compile-time verified layouts via `zerocopy`. Every
//! declared size is checked against the bytes actually present before any
//! slice is taken, and all size arithmetic is checked. Integers are
//! little-endian regardless of host byte order.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod frame;
pub mod header;
pub mod layout;

pub use errors::{ProtocolError, Result};
pub use frame::{FrameReader, encode_frame};
pub use header::{InnerHeader, PackageHeader};
pub use layout::SealedLayout;

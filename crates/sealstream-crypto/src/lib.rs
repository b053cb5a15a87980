//! Sealed-package codec and directional key ratchet.
//!
//! The codec turns `(key_meta, meta, data, extra_aad)` into one authenticated,
//! block-aligned package with AES-GCM and inverts that operation. The ratchet
//! wraps a codec with the per-direction key state used by the secure stream
//! socket: a secret key, a mask key and a message counter that together
//! determine the key and AAD of every message in that direction.
//!
//! After `rekey_limit` messages a direction derives fresh keys with
//! HKDF-SHA256 and restarts its counter, so no single key ever protects more
//! than a bounded number of messages.
//!
//! # Security
//!
//! Key material and decrypted plaintext are zeroized on drop. IVs come from a
//! caller-supplied cryptographically secure RNG. Expected-tag pinning uses a
//! constant-time comparison.

pub mod aead;
pub mod codec;
pub mod error;
pub mod key;
pub mod ratchet;

pub use aead::AesGcmCipher;
pub use codec::{OpenedPackage, SealedCodec, SealedPackage};
pub use error::{Result, SealError};
pub use key::{KeySize, SymmetricKey};
pub use ratchet::{Direction, DirectionalState, MASK_KEY_LABEL, SECRET_KEY_LABEL, derive_next_key};

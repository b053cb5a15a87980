//! Symmetric key material.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SealError};

/// Supported AEAD key sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySize {
    /// 128-bit key (AES-128-GCM)
    #[default]
    Aes128,
    /// 256-bit key (AES-256-GCM)
    Aes256,
}

impl KeySize {
    /// Key length in bytes.
    pub const fn byte_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes256 => 32,
        }
    }

    /// Key length in bits.
    pub const fn bits(self) -> usize {
        self.byte_len() * 8
    }

    /// Key size for a raw key of `len` bytes, if supported.
    pub const fn from_byte_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(Self::Aes128),
            32 => Some(Self::Aes256),
            _ => None,
        }
    }
}

/// A 128- or 256-bit symmetric key.
///
/// Zeroized on drop and redacted in `Debug`. Equality is constant-time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// `InvalidKeyLength` unless `bytes` is 16 or 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if KeySize::from_byte_len(bytes.len()).is_none() {
            return Err(SealError::InvalidKeyLength { actual: bytes.len() });
        }
        Ok(Self { bytes: bytes.to_vec() })
    }

    /// Generate a fresh random key.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(size: KeySize, rng: &mut R) -> Self {
        let mut bytes = vec![0u8; size.byte_len()];
        rng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Raw key bytes.
    ///
    /// Avoid logging or persisting the returned bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of this key.
    pub fn key_size(&self) -> KeySize {
        if self.bytes.len() == KeySize::Aes256.byte_len() { KeySize::Aes256 } else { KeySize::Aes128 }
    }
}

impl From<[u8; 16]> for SymmetricKey {
    fn from(bytes: [u8; 16]) -> Self {
        Self { bytes: bytes.to_vec() }
    }
}

impl From<[u8; 32]> for SymmetricKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self { bytes: bytes.to_vec() }
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SymmetricKey {}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey({}-bit, [REDACTED])", self.key_size().bits())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    #[test]
    fn accepts_supported_lengths_only() {
        assert!(SymmetricKey::from_bytes(&[0; 16]).is_ok());
        assert!(SymmetricKey::from_bytes(&[0; 32]).is_ok());
        assert_eq!(
            SymmetricKey::from_bytes(&[0; 24]),
            Err(SealError::InvalidKeyLength { actual: 24 })
        );
        assert_eq!(SymmetricKey::from_bytes(&[]), Err(SealError::InvalidKeyLength { actual: 0 }));
    }

    #[test]
    fn key_size_follows_length() {
        assert_eq!(SymmetricKey::from([0u8; 16]).key_size(), KeySize::Aes128);
        assert_eq!(SymmetricKey::from([0u8; 32]).key_size(), KeySize::Aes256);
        assert_eq!(KeySize::Aes128.bits(), 128);
        assert_eq!(KeySize::from_byte_len(32), Some(KeySize::Aes256));
    }

    #[test]
    fn debug_is_redacted() {
        let key = SymmetricKey::from([0x42u8; 16]);
        let rendered = format!("{key:?}");

        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("42"));
    }

    #[test]
    fn generate_uses_rng() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let a = SymmetricKey::generate(KeySize::Aes256, &mut rng);
        let b = SymmetricKey::generate(KeySize::Aes256, &mut rng);

        assert_eq!(a.as_bytes().len(), 32);
        assert_ne!(a, b);
    }
}

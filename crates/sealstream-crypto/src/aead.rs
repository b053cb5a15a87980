//! AES-GCM primitive.
//!
//! Detached-tag, in-place encryption with a 96-bit IV and a 128-bit tag. The
//! codec owns the buffer layout; this module only runs the cipher.

use aes_gcm::{
    Aes128Gcm, Aes256Gcm,
    aead::{AeadInPlace, KeyInit, Nonce, Tag},
};
use sealstream_proto::header::{IV_SIZE, TAG_SIZE};

use crate::{
    error::{Result, SealError},
    key::{KeySize, SymmetricKey},
};

/// AES-GCM keyed with a 128- or 256-bit key.
#[derive(Clone)]
pub enum AesGcmCipher {
    /// AES-128-GCM
    Aes128(Box<Aes128Gcm>),
    /// AES-256-GCM
    Aes256(Box<Aes256Gcm>),
}

impl AesGcmCipher {
    /// Key the cipher.
    pub fn new(key: &SymmetricKey) -> Result<Self> {
        let bytes = key.as_bytes();
        let invalid = |_| SealError::InvalidKeyLength { actual: bytes.len() };

        match key.key_size() {
            KeySize::Aes128 => {
                Aes128Gcm::new_from_slice(bytes).map(|c| Self::Aes128(Box::new(c))).map_err(invalid)
            },
            KeySize::Aes256 => {
                Aes256Gcm::new_from_slice(bytes).map(|c| Self::Aes256(Box::new(c))).map_err(invalid)
            },
        }
    }

    /// Encrypt `buffer` in place and return the tag.
    pub fn encrypt_in_place(
        &self,
        iv: &[u8; IV_SIZE],
        aad: &[u8],
        buffer: &mut [u8],
    ) -> Result<[u8; TAG_SIZE]> {
        match self {
            Self::Aes128(cipher) => seal_detached(cipher.as_ref(), iv, aad, buffer),
            Self::Aes256(cipher) => seal_detached(cipher.as_ref(), iv, aad, buffer),
        }
    }

    /// Decrypt `buffer` in place after verifying `tag`.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailure` if the tag does not verify; `buffer` is left
    /// unmodified in that case.
    pub fn decrypt_in_place(
        &self,
        iv: &[u8; IV_SIZE],
        aad: &[u8],
        buffer: &mut [u8],
        tag: &[u8; TAG_SIZE],
    ) -> Result<()> {
        match self {
            Self::Aes128(cipher) => open_detached(cipher.as_ref(), iv, aad, buffer, tag),
            Self::Aes256(cipher) => open_detached(cipher.as_ref(), iv, aad, buffer, tag),
        }
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aes128(_) => f.write_str("AesGcmCipher::Aes128"),
            Self::Aes256(_) => f.write_str("AesGcmCipher::Aes256"),
        }
    }
}

fn seal_detached<A: AeadInPlace>(
    cipher: &A,
    iv: &[u8; IV_SIZE],
    aad: &[u8],
    buffer: &mut [u8],
) -> Result<[u8; TAG_SIZE]> {
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<A>::from_slice(iv), aad, buffer)
        .map_err(|_| SealError::Encryption)?;

    let mut out = [0u8; TAG_SIZE];
    out.copy_from_slice(tag.as_slice());
    Ok(out)
}

fn open_detached<A: AeadInPlace>(
    cipher: &A,
    iv: &[u8; IV_SIZE],
    aad: &[u8],
    buffer: &mut [u8],
    tag: &[u8; TAG_SIZE],
) -> Result<()> {
    cipher
        .decrypt_in_place_detached(Nonce::<A>::from_slice(iv), aad, buffer, Tag::<A>::from_slice(tag))
        .map_err(|_| SealError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt() {
        let cipher = AesGcmCipher::new(&SymmetricKey::from([3u8; 16])).unwrap();
        let iv = [1u8; IV_SIZE];

        let mut buffer = b"attack at dawn".to_vec();
        let tag = cipher.encrypt_in_place(&iv, b"header", &mut buffer).unwrap();
        assert_ne!(&buffer[..], b"attack at dawn");

        cipher.decrypt_in_place(&iv, b"header", &mut buffer, &tag).unwrap();
        assert_eq!(&buffer[..], b"attack at dawn");
    }

    #[test]
    fn aes256_roundtrip() {
        let cipher = AesGcmCipher::new(&SymmetricKey::from([3u8; 32])).unwrap();
        assert!(matches!(cipher, AesGcmCipher::Aes256(_)));

        let iv = [9u8; IV_SIZE];
        let mut buffer = vec![0u8; 64];
        let tag = cipher.encrypt_in_place(&iv, &[], &mut buffer).unwrap();
        cipher.decrypt_in_place(&iv, &[], &mut buffer, &tag).unwrap();
        assert_eq!(buffer, vec![0u8; 64]);
    }

    #[test]
    fn wrong_aad_fails_authentication() {
        let cipher = AesGcmCipher::new(&SymmetricKey::from([3u8; 16])).unwrap();
        let iv = [1u8; IV_SIZE];

        let mut buffer = b"payload".to_vec();
        let tag = cipher.encrypt_in_place(&iv, b"aad-1", &mut buffer).unwrap();

        let result = cipher.decrypt_in_place(&iv, b"aad-2", &mut buffer, &tag);
        assert_eq!(result, Err(SealError::AuthenticationFailure));
    }
}

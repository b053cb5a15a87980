//! Sealed-package codec.
//!
//! # Wire Format
//!
//! ```text
//! [tag: 16][iv: 12][payload_size: 8][key_meta_size: 8][key_meta: K][ciphertext: P]
//! ```
//!
//! The AAD is everything between the tag and the ciphertext, optionally
//! followed by caller-supplied extra AAD that is never transmitted. The
//! ciphertext decrypts to:
//!
//! ```text
//! [meta_size: 8][data_size: 8][meta][data][zero padding]
//! ```
//!
//! `P` is chosen so the package length is a multiple of the block size.

use std::borrow::Cow;

use rand::{CryptoRng, RngCore};
use sealstream_proto::{
    InnerHeader, PackageHeader, SealedLayout,
    header::{IV_SIZE, TAG_SIZE},
};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{
    aead::AesGcmCipher,
    error::{Result, SealError},
    key::SymmetricKey,
};

/// Output of [`SealedCodec::pack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPackage {
    bytes: Vec<u8>,
    tag: [u8; TAG_SIZE],
}

impl SealedPackage {
    /// Package bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Tag written into the package header.
    pub fn tag(&self) -> &[u8; TAG_SIZE] {
        &self.tag
    }

    /// Package length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a package carries at least its header.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the package bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Output of [`SealedCodec::unpack`].
#[derive(Debug)]
pub struct OpenedPackage {
    /// Application data
    pub data: Zeroizing<Vec<u8>>,
    /// Encrypted metadata carried alongside the data
    pub meta: Zeroizing<Vec<u8>>,
}

/// Packs and unpacks sealed packages under one key.
///
/// Stateless beyond the key and block size. Every `pack` draws a fresh IV
/// from the caller's RNG, so one codec can seal any number of packages.
#[derive(Debug, Clone)]
pub struct SealedCodec {
    cipher: AesGcmCipher,
    block_size: usize,
}

impl SealedCodec {
    /// Create a codec bound to `key` that pads packages to `block_size`.
    ///
    /// # Errors
    ///
    /// `SizeMismatch(InvalidBlockSize)` for a zero block size.
    pub fn new(key: &SymmetricKey, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(sealstream_proto::ProtocolError::InvalidBlockSize.into());
        }
        Ok(Self { cipher: AesGcmCipher::new(key)?, block_size })
    }

    /// Block alignment of produced packages.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Seal `meta` and `data` under this codec's key.
    ///
    /// `key_meta` travels in plaintext but is authenticated; `extra_aad` is
    /// authenticated and never written to the package.
    pub fn pack<R: RngCore + CryptoRng + ?Sized>(
        &self,
        key_meta: &[u8],
        meta: &[u8],
        data: &[u8],
        extra_aad: &[u8],
        rng: &mut R,
    ) -> Result<SealedPackage> {
        let layout = SealedLayout::compute(self.block_size, key_meta.len(), meta.len(), data.len())?;

        let mut payload = Zeroizing::new(vec![0u8; layout.encrypted_size]);
        let meta_end = InnerHeader::SIZE + meta.len();
        let data_end = meta_end + data.len();
        payload[..InnerHeader::SIZE]
            .copy_from_slice(&InnerHeader::new(meta.len() as u64, data.len() as u64).to_bytes());
        payload[InnerHeader::SIZE..meta_end].copy_from_slice(meta);
        payload[meta_end..data_end].copy_from_slice(data);

        let mut iv = [0u8; IV_SIZE];
        rng.fill_bytes(&mut iv);

        let header = PackageHeader::new(iv, layout.encrypted_size as u64, key_meta.len() as u64);
        let mut bytes = Vec::with_capacity(layout.total_size);
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(key_meta);

        let tag = {
            let aad = full_aad(&bytes[PackageHeader::AAD_OFFSET..], extra_aad);
            self.cipher.encrypt_in_place(&iv, &aad, &mut payload)?
        };

        bytes[..TAG_SIZE].copy_from_slice(&tag);
        bytes.extend_from_slice(&payload);

        debug_assert_eq!(bytes.len(), layout.total_size, "sealed package size arithmetic");
        debug_assert_eq!(layout.ciphertext_offset() + layout.encrypted_size, bytes.len());

        Ok(SealedPackage { bytes, tag })
    }

    /// Verify and decrypt a package.
    ///
    /// `extra_aad` must equal the value used when packing. When
    /// `expected_tag` is given, the package tag must also equal it.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch` if the header or inner sizes do not account for the
    ///   bytes present
    /// - `AuthenticationFailure` if the AEAD tag does not verify
    /// - `TagMismatch` if the tag differs from `expected_tag`
    pub fn unpack(
        &self,
        package: &[u8],
        extra_aad: &[u8],
        expected_tag: Option<&[u8; TAG_SIZE]>,
    ) -> Result<OpenedPackage> {
        let header = PackageHeader::from_bytes(package)?;
        let ciphertext = header.ciphertext_range(package.len())?;

        let aad = full_aad(&package[PackageHeader::AAD_OFFSET..ciphertext.start], extra_aad);
        let mut payload = Zeroizing::new(package[ciphertext].to_vec());
        self.cipher.decrypt_in_place(header.iv(), &aad, &mut payload, header.tag())?;

        if let Some(expected) = expected_tag
            && !bool::from(header.tag()[..].ct_eq(&expected[..]))
        {
            return Err(SealError::TagMismatch);
        }

        let inner = InnerHeader::from_bytes(&payload)?;
        let (meta, data) = inner.split(payload.len())?;

        Ok(OpenedPackage {
            data: Zeroizing::new(payload[data].to_vec()),
            meta: Zeroizing::new(payload[meta].to_vec()),
        })
    }

    /// Key metadata of a package, without touching the ciphertext.
    ///
    /// Lets a receiver find out which key sealed a package before it has
    /// a codec for that key.
    pub fn key_meta(package: &[u8]) -> Result<&[u8]> {
        let header = PackageHeader::from_bytes(package)?;
        let range = header.key_meta_range(package.len())?;
        Ok(&package[range])
    }
}

/// Header AAD followed by the caller's extra AAD, if any.
fn full_aad<'a>(header_aad: &'a [u8], extra_aad: &[u8]) -> Cow<'a, [u8]> {
    if extra_aad.is_empty() {
        return Cow::Borrowed(header_aad);
    }

    let mut aad = Vec::with_capacity(header_aad.len() + extra_aad.len());
    aad.extend_from_slice(header_aad);
    aad.extend_from_slice(extra_aad);
    Cow::Owned(aad)
}

//! Fixed-size headers of a sealed package.
//!
//! [`PackageHeader`] is the plaintext prefix of every package (tag, IV and the
//! two size fields). [`InnerHeader`] is the first 16 bytes of the encrypted
//! region and is only visible after decryption.

use std::ops::Range;

use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, byteorder::little_endian::U64,
};

use crate::errors::{ProtocolError, Result};

/// AEAD tag length.
pub const TAG_SIZE: usize = 16;

/// AEAD IV (nonce) length.
pub const IV_SIZE: usize = 12;

/// Width of every size field.
pub const SIZE_FIELD_SIZE: usize = 8;

/// Header bytes covered by the AAD: IV, PayloadSize and KeyMetaSize.
pub const KNOWN_AAD_SIZE: usize = IV_SIZE + SIZE_FIELD_SIZE + SIZE_FIELD_SIZE;

/// Plaintext header of a sealed package (44 bytes).
///
/// Layout:
/// - `[0..16]`  tag (filled after encryption)
/// - `[16..28]` IV
/// - `[28..36]` payload size (ciphertext length, LE)
/// - `[36..44]` key metadata size (LE)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct PackageHeader {
    tag: [u8; TAG_SIZE],
    iv: [u8; IV_SIZE],
    payload_size: U64,
    key_meta_size: U64,
}

impl PackageHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 44;

    /// Offset where the authenticated header region begins (right after the tag).
    pub const AAD_OFFSET: usize = TAG_SIZE;

    /// Create a header with an all-zero tag.
    pub fn new(iv: [u8; IV_SIZE], payload_size: u64, key_meta_size: u64) -> Self {
        Self {
            tag: [0; TAG_SIZE],
            iv,
            payload_size: U64::new(payload_size),
            key_meta_size: U64::new(key_meta_size),
        }
    }

    /// Borrow the header at the start of `bytes`.
    ///
    /// Trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes).map(|(header, _)| header).map_err(|_| {
            ProtocolError::PackageTooShort { expected: Self::SIZE, actual: bytes.len() }
        })
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// AEAD tag.
    pub fn tag(&self) -> &[u8; TAG_SIZE] {
        &self.tag
    }

    /// Replace the AEAD tag.
    pub fn set_tag(&mut self, tag: [u8; TAG_SIZE]) {
        self.tag = tag;
    }

    /// AEAD IV.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Declared ciphertext length.
    pub fn payload_size(&self) -> u64 {
        self.payload_size.get()
    }

    /// Declared key metadata length.
    pub fn key_meta_size(&self) -> u64 {
        self.key_meta_size.get()
    }

    /// Byte range of the key metadata inside a package of `package_len` bytes.
    ///
    /// Only the key metadata has to be present; the ciphertext is not checked.
    pub fn key_meta_range(&self, package_len: usize) -> Result<Range<usize>> {
        let key_meta_size =
            usize::try_from(self.key_meta_size()).map_err(|_| ProtocolError::LengthOverflow)?;
        let end = Self::SIZE.checked_add(key_meta_size).ok_or(ProtocolError::LengthOverflow)?;

        if package_len < end {
            return Err(ProtocolError::PackageTooShort { expected: end, actual: package_len });
        }

        Ok(Self::SIZE..end)
    }

    /// Byte range of the ciphertext inside a package of `package_len` bytes.
    ///
    /// The header sizes must account for the package length exactly.
    pub fn ciphertext_range(&self, package_len: usize) -> Result<Range<usize>> {
        let declared = (Self::SIZE as u64)
            .checked_add(self.key_meta_size())
            .and_then(|n| n.checked_add(self.payload_size()))
            .ok_or(ProtocolError::LengthOverflow)?;

        if declared != package_len as u64 {
            return Err(ProtocolError::SizeMismatch { declared, actual: package_len });
        }

        // Both fit: their sum equals a usize.
        let start = Self::SIZE + self.key_meta_size() as usize;
        Ok(start..package_len)
    }
}

/// Header at the start of the decrypted payload (16 bytes).
///
/// Layout:
/// - `[0..8]`  metadata size (LE)
/// - `[8..16]` data size (LE)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct InnerHeader {
    meta_size: U64,
    data_size: U64,
}

impl InnerHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 16;

    /// Create an inner header.
    pub fn new(meta_size: u64, data_size: u64) -> Self {
        Self { meta_size: U64::new(meta_size), data_size: U64::new(data_size) }
    }

    /// Borrow the inner header at the start of a decrypted payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes).map(|(header, _)| header).map_err(|_| {
            ProtocolError::PackageTooShort { expected: Self::SIZE, actual: bytes.len() }
        })
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// Declared metadata length.
    pub fn meta_size(&self) -> u64 {
        self.meta_size.get()
    }

    /// Declared data length.
    pub fn data_size(&self) -> u64 {
        self.data_size.get()
    }

    /// Split a decrypted payload of `payload_len` bytes into metadata and data
    /// ranges. Anything after the data is padding.
    pub fn split(&self, payload_len: usize) -> Result<(Range<usize>, Range<usize>)> {
        let declared = (Self::SIZE as u64)
            .checked_add(self.meta_size())
            .and_then(|n| n.checked_add(self.data_size()))
            .ok_or(ProtocolError::LengthOverflow)?;

        if (payload_len as u64) < declared {
            return Err(ProtocolError::InnerSizeMismatch { declared, available: payload_len });
        }

        let meta_end = Self::SIZE + self.meta_size() as usize;
        let data_end = meta_end + self.data_size() as usize;
        Ok((Self::SIZE..meta_end, meta_end..data_end))
    }
}

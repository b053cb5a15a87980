//! Size arithmetic for sealed packages.
//!
//! The encrypted region is padded so the complete package (header, key
//! metadata and ciphertext) lands on a multiple of the block size. Padding
//! is encrypted zeros and is never interpreted.

use crate::{
    errors::{ProtocolError, Result},
    header::{InnerHeader, KNOWN_AAD_SIZE, PackageHeader},
};

/// Bytes every package carries regardless of its contents: the plaintext
/// header plus the inner header.
pub const FIXED_OVERHEAD: usize = PackageHeader::SIZE + InnerHeader::SIZE;

/// Default block alignment.
pub const DEFAULT_BLOCK_SIZE: usize = 128;

/// Computed sizes for one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedLayout {
    /// Length of the complete package; a multiple of the block size.
    pub total_size: usize,
    /// Header bytes covered by the AAD (IV, both size fields, key metadata).
    pub aad_size: usize,
    /// Length of the encrypted region (inner header, meta, data, padding).
    pub encrypted_size: usize,
    /// Padding appended after the data.
    pub pad_size: usize,
    /// Length of the key metadata.
    pub key_meta_size: usize,
}

impl SealedLayout {
    /// Compute the layout for the given component lengths.
    ///
    /// # Errors
    ///
    /// - `InvalidBlockSize` if `block_size` is zero
    /// - `LengthOverflow` if the padded total does not fit in `usize`
    pub fn compute(
        block_size: usize,
        key_meta_len: usize,
        meta_len: usize,
        data_len: usize,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(ProtocolError::InvalidBlockSize);
        }

        let raw_total = FIXED_OVERHEAD
            .checked_add(key_meta_len)
            .and_then(|n| n.checked_add(meta_len))
            .and_then(|n| n.checked_add(data_len))
            .ok_or(ProtocolError::LengthOverflow)?;

        let total_size =
            raw_total.checked_next_multiple_of(block_size).ok_or(ProtocolError::LengthOverflow)?;
        let pad_size = total_size - raw_total;

        // Cannot overflow: bounded by total_size.
        let encrypted_size = InnerHeader::SIZE + meta_len + data_len + pad_size;
        let aad_size = KNOWN_AAD_SIZE + key_meta_len;

        Ok(Self { total_size, aad_size, encrypted_size, pad_size, key_meta_size: key_meta_len })
    }

    /// Offset of the ciphertext inside the package.
    pub fn ciphertext_offset(&self) -> usize {
        PackageHeader::SIZE + self.key_meta_size
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::header::TAG_SIZE;

    #[test]
    fn small_message_fills_one_block() {
        let layout = SealedLayout::compute(128, 0, 0, 4).unwrap();

        assert_eq!(
            layout,
            SealedLayout {
                total_size: 128,
                aad_size: 28,
                encrypted_size: 84,
                pad_size: 64,
                key_meta_size: 0,
            }
        );
        assert_eq!(layout.ciphertext_offset(), 44);
    }

    #[test]
    fn exact_fit_needs_no_padding() {
        // 60 fixed + 4 key meta + 0 meta + 0 data = 64
        let layout = SealedLayout::compute(64, 4, 0, 0).unwrap();
        assert_eq!(layout.total_size, 64);
        assert_eq!(layout.pad_size, 0);
    }

    #[test]
    fn one_byte_over_spills_into_next_block() {
        let layout = SealedLayout::compute(64, 4, 0, 1).unwrap();
        assert_eq!(layout.total_size, 128);
        assert_eq!(layout.pad_size, 63);
    }

    #[test]
    fn zero_block_size_rejected() {
        assert_eq!(SealedLayout::compute(0, 0, 0, 0), Err(ProtocolError::InvalidBlockSize));
    }

    #[test]
    fn overflow_rejected() {
        assert_eq!(
            SealedLayout::compute(128, usize::MAX - 10, 0, 0),
            Err(ProtocolError::LengthOverflow)
        );
    }

    proptest! {
        #[test]
        fn layout_is_block_aligned_and_consistent(
            block_size in 1usize..512,
            key_meta_len in 0usize..300,
            meta_len in 0usize..300,
            data_len in 0usize..5000,
        ) {
            let layout = SealedLayout::compute(block_size, key_meta_len, meta_len, data_len).unwrap();

            prop_assert_eq!(layout.total_size % block_size, 0);
            prop_assert!(layout.pad_size < block_size);
            prop_assert_eq!(
                layout.total_size,
                TAG_SIZE + layout.aad_size + layout.encrypted_size
            );
            prop_assert_eq!(
                layout.total_size,
                FIXED_OVERHEAD + key_meta_len + meta_len + data_len + layout.pad_size
            );
        }
    }
}

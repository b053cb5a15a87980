//! Socket configuration.

use sealstream_crypto::KeySize;
use sealstream_proto::{frame::DEFAULT_MAX_FRAME_SIZE, layout::DEFAULT_BLOCK_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::SocketError;

/// Secure stream socket configuration.
///
/// Both peers must use the same `block_size`, `key_size` and `rekey_limit`.
/// `max_frame_size` is local policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Packages are padded to a multiple of this many bytes
    pub block_size: usize,
    /// Size of the secret and mask keys
    pub key_size: KeySize,
    /// Largest frame accepted from the peer
    pub max_frame_size: u64,
    /// Counter value at which a direction rotates its keys
    pub rekey_limit: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            key_size: KeySize::Aes128,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            rekey_limit: u64::MAX,
        }
    }
}

impl SocketConfig {
    /// Reject settings no socket can run with.
    pub fn validate(&self) -> Result<(), SocketError> {
        if self.block_size == 0 {
            return Err(SocketError::InvalidConfig("block_size must be positive".into()));
        }

        if self.max_frame_size == 0 {
            return Err(SocketError::InvalidConfig("max_frame_size must be positive".into()));
        }

        let smallest_package = sealstream_proto::SealedLayout::compute(self.block_size, 0, 0, 0)
            .map_err(|e| SocketError::InvalidConfig(e.to_string()))?
            .total_size as u64;
        if self.max_frame_size < smallest_package {
            return Err(SocketError::InvalidConfig(format!(
                "max_frame_size {} is below the smallest package ({smallest_package} bytes)",
                self.max_frame_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SocketConfig::default();

        assert_eq!(config.block_size, 128);
        assert_eq!(config.key_size, KeySize::Aes128);
        assert_eq!(config.max_frame_size, 16 * 1024 * 1024);
        assert_eq!(config.rekey_limit, u64::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_block_size() {
        let config = SocketConfig { block_size: 0, ..SocketConfig::default() };
        assert!(matches!(config.validate(), Err(SocketError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_frame_limit_below_one_package() {
        let config = SocketConfig { max_frame_size: 0, ..SocketConfig::default() };
        assert!(matches!(config.validate(), Err(SocketError::InvalidConfig(_))));

        let config = SocketConfig { max_frame_size: 127, ..SocketConfig::default() };
        assert!(matches!(config.validate(), Err(SocketError::InvalidConfig(_))));

        let config = SocketConfig { max_frame_size: 128, ..SocketConfig::default() };
        assert!(config.validate().is_ok());
    }
}

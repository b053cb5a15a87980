//! Per-direction key state and ratchet.
//!
//! Each direction of a connection owns a secret key (the AEAD key), a mask
//! key and a message counter. Every message is sealed with the extra AAD
//! `mask_key || counter` (counter little-endian), so both peers must agree on
//! the exact position in the stream for a message to open.
//!
//! # Ratchet
//!
//! After each message the counter advances. When it reaches the rekey limit
//! the direction derives:
//!
//! ```text
//! secret' = HKDF-SHA256(ikm = secret, salt = none, info = "next_secret_key")
//! mask'   = HKDF-SHA256(ikm = mask,   salt = none, info = "next_maskin_key")
//! ```
//!
//! rebuilds its codec from `secret'` and restarts the counter at zero. Both
//! directions start from the same handshake keys and drift apart only
//! because their counters advance independently.

use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::{
    codec::{SealedCodec, SealedPackage},
    error::{Result, SealError},
    key::SymmetricKey,
};

/// HKDF info label for the next secret key.
pub const SECRET_KEY_LABEL: &[u8] = b"next_secret_key";

/// HKDF info label for the next mask key.
pub const MASK_KEY_LABEL: &[u8] = b"next_maskin_key";

/// Derive the successor of `key` under `label`. Output length equals the
/// input key length.
pub fn derive_next_key(key: &SymmetricKey, label: &[u8]) -> Result<SymmetricKey> {
    let hkdf = Hkdf::<Sha256>::new(None, key.as_bytes());
    let mut okm = Zeroizing::new(vec![0u8; key.as_bytes().len()]);
    hkdf.expand(label, &mut okm).map_err(|_| SealError::KeyDerivation)?;
    SymmetricKey::from_bytes(&okm)
}

/// Which way a directional state protects traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Messages this side sends
    Outgoing,
    /// Messages this side receives
    Incoming,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outgoing => f.write_str("outgoing"),
            Self::Incoming => f.write_str("incoming"),
        }
    }
}

/// Key state for one direction of a connection.
#[derive(Debug)]
pub struct DirectionalState {
    direction: Direction,
    secret_key: SymmetricKey,
    mask_key: SymmetricKey,
    counter: u64,
    rekey_limit: u64,
    generation: u64,
    codec: SealedCodec,
}

impl DirectionalState {
    /// Seed a direction from handshake keys.
    ///
    /// The codec pads packages to `block_size`. The direction rekeys after
    /// the message sent or received with counter `rekey_limit`.
    pub fn new(
        direction: Direction,
        secret_key: SymmetricKey,
        mask_key: SymmetricKey,
        block_size: usize,
        rekey_limit: u64,
    ) -> Result<Self> {
        let codec = SealedCodec::new(&secret_key, block_size)?;
        Ok(Self { direction, secret_key, mask_key, counter: 0, rekey_limit, generation: 0, codec })
    }

    /// Resume at a known counter position within the current keys.
    #[must_use]
    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = counter;
        self
    }

    /// Direction this state protects.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Counter of the next message.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Number of rekeys performed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Counter value that triggers a rekey.
    pub fn rekey_limit(&self) -> u64 {
        self.rekey_limit
    }

    /// Current AEAD key.
    pub fn secret_key(&self) -> &SymmetricKey {
        &self.secret_key
    }

    /// Current mask key.
    pub fn mask_key(&self) -> &SymmetricKey {
        &self.mask_key
    }

    /// Extra AAD for the next message: `mask_key || counter` (LE).
    pub fn extra_aad(&self) -> Zeroizing<Vec<u8>> {
        let mask = self.mask_key.as_bytes();
        let mut aad = Zeroizing::new(Vec::with_capacity(mask.len() + 8));
        aad.extend_from_slice(mask);
        aad.extend_from_slice(&self.counter.to_le_bytes());
        aad
    }

    /// Seal `data` as the next message and advance.
    pub fn seal<R: RngCore + CryptoRng + ?Sized>(
        &mut self,
        data: &[u8],
        rng: &mut R,
    ) -> Result<SealedPackage> {
        let package = self.codec.pack(&[], &[], data, &self.extra_aad(), rng)?;
        trace!(
            direction = %self.direction,
            counter = self.counter,
            len = package.len(),
            "sealed message"
        );

        self.advance()?;
        Ok(package)
    }

    /// Open `package` as the next message and advance.
    ///
    /// The state does not advance on failure.
    pub fn open(&mut self, package: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let opened = self.codec.unpack(package, &self.extra_aad(), None)?;
        trace!(
            direction = %self.direction,
            counter = self.counter,
            len = opened.data.len(),
            "opened message"
        );

        self.advance()?;
        Ok(opened.data)
    }

    /// Move past the current message, rekeying at the limit.
    pub fn advance(&mut self) -> Result<()> {
        if self.counter >= self.rekey_limit {
            self.rekey()
        } else {
            self.counter += 1;
            Ok(())
        }
    }

    fn rekey(&mut self) -> Result<()> {
        let secret_key = derive_next_key(&self.secret_key, SECRET_KEY_LABEL)?;
        let mask_key = derive_next_key(&self.mask_key, MASK_KEY_LABEL)?;
        let codec = SealedCodec::new(&secret_key, self.codec.block_size())?;

        self.secret_key = secret_key;
        self.mask_key = mask_key;
        self.codec = codec;
        self.counter = 0;
        self.generation += 1;

        debug!(direction = %self.direction, generation = self.generation, "rotated directional keys");
        Ok(())
    }
}

//! Handshake capability.
//!
//! A handshake runs over the raw stream before the secure socket exists and
//! leaves behind one secret key and one mask key. The socket only needs to
//! know when the handshake is done and what the keys are; how they were
//! agreed (attestation, key exchange, provisioning) is up to the
//! implementation.
//!
//! The driving loop is `while !is_done() { step(stream) }`, provided as
//! [`Handshake::run`] and [`AsyncHandshake::run`].

use async_trait::async_trait;
use rand::{CryptoRng, RngCore};
use sealstream_crypto::{KeySize, SymmetricKey};

use crate::error::HandshakeError;

/// Blocking handshake over a raw stream `S`.
pub trait Handshake<S> {
    /// True once both keys are available.
    fn is_done(&self) -> bool;

    /// Perform one unit of handshake I/O.
    fn step(&mut self, stream: &mut S) -> Result<(), HandshakeError>;

    /// Agreed secret key.
    ///
    /// # Errors
    ///
    /// `Incomplete` before [`Self::is_done`] returns true.
    fn secret_key(&self) -> Result<&SymmetricKey, HandshakeError>;

    /// Agreed mask key.
    ///
    /// # Errors
    ///
    /// `Incomplete` before [`Self::is_done`] returns true.
    fn mask_key(&self) -> Result<&SymmetricKey, HandshakeError>;

    /// Step until done.
    fn run(&mut self, stream: &mut S) -> Result<(), HandshakeError> {
        while !self.is_done() {
            self.step(stream)?;
        }
        Ok(())
    }
}

/// Async handshake over a raw stream `S`.
#[async_trait]
pub trait AsyncHandshake<S: Send>: Send {
    /// True once both keys are available.
    fn is_done(&self) -> bool;

    /// Perform one unit of handshake I/O.
    async fn step(&mut self, stream: &mut S) -> Result<(), HandshakeError>;

    /// Agreed secret key.
    fn secret_key(&self) -> Result<&SymmetricKey, HandshakeError>;

    /// Agreed mask key.
    fn mask_key(&self) -> Result<&SymmetricKey, HandshakeError>;

    /// Step until done.
    async fn run(&mut self, stream: &mut S) -> Result<(), HandshakeError> {
        while !self.is_done() {
            self.step(stream).await?;
        }
        Ok(())
    }
}

/// A handshake that already happened: both keys were provisioned out of band.
///
/// Never touches the stream.
#[derive(Debug, Clone)]
pub struct PresharedHandshake {
    secret_key: SymmetricKey,
    mask_key: SymmetricKey,
}

impl PresharedHandshake {
    /// Wrap a provisioned key pair.
    pub fn new(secret_key: SymmetricKey, mask_key: SymmetricKey) -> Self {
        Self { secret_key, mask_key }
    }

    /// Generate a fresh key pair to hand to both peers.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(key_size: KeySize, rng: &mut R) -> Self {
        Self {
            secret_key: SymmetricKey::generate(key_size, rng),
            mask_key: SymmetricKey::generate(key_size, rng),
        }
    }
}

impl<S> Handshake<S> for PresharedHandshake {
    fn is_done(&self) -> bool {
        true
    }

    fn step(&mut self, _stream: &mut S) -> Result<(), HandshakeError> {
        Ok(())
    }

    fn secret_key(&self) -> Result<&SymmetricKey, HandshakeError> {
        Ok(&self.secret_key)
    }

    fn mask_key(&self) -> Result<&SymmetricKey, HandshakeError> {
        Ok(&self.mask_key)
    }
}

#[async_trait]
impl<S: Send> AsyncHandshake<S> for PresharedHandshake {
    fn is_done(&self) -> bool {
        true
    }

    async fn step(&mut self, _stream: &mut S) -> Result<(), HandshakeError> {
        Ok(())
    }

    fn secret_key(&self) -> Result<&SymmetricKey, HandshakeError> {
        Ok(&self.secret_key)
    }

    fn mask_key(&self) -> Result<&SymmetricKey, HandshakeError> {
        Ok(&self.mask_key)
    }
}

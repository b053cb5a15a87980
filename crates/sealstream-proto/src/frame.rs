//! Length-prefixed stream framing.
//!
//! Each sealed package crosses the stream as `[len: u64 LE][package]`.
//!
//! [`FrameReader`] is the receive side as a sans-IO state machine: the caller
//! asks for the slice to fill next, performs whatever read it likes (blocking,
//! async, one byte at a time), and reports how many bytes landed. All partial
//! progress lives in the reader, so an interrupted read resumes exactly where
//! it stopped.

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{ProtocolError, Result};

/// Size of the frame length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Default upper bound on a single frame (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u64 = 16 * 1024 * 1024;

/// Prefix `package` with its little-endian length.
pub fn encode_frame(package: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + package.len());
    buf.put_u64_le(package.len() as u64);
    buf.put_slice(package);
    buf.freeze()
}

#[derive(Debug)]
enum ReadState {
    /// Collecting the length prefix.
    Length { prefix: [u8; LENGTH_PREFIX_SIZE], filled: usize },
    /// Collecting `body.len()` bytes of package.
    Body { body: BytesMut, filled: usize },
}

impl ReadState {
    fn idle() -> Self {
        Self::Length { prefix: [0; LENGTH_PREFIX_SIZE], filled: 0 }
    }
}

/// Incremental reader for length-prefixed frames.
#[derive(Debug)]
pub struct FrameReader {
    max_frame_size: u64,
    state: ReadState,
}

impl FrameReader {
    /// Create a reader that rejects frames larger than `max_frame_size`.
    pub fn new(max_frame_size: u64) -> Self {
        Self { max_frame_size, state: ReadState::idle() }
    }

    /// Configured frame limit.
    pub fn max_frame_size(&self) -> u64 {
        self.max_frame_size
    }

    /// True when no bytes of the next frame have been received yet.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, ReadState::Length { filled: 0, .. })
    }

    /// Number of bytes of the current frame (prefix or body) received so far.
    pub fn bytes_received(&self) -> usize {
        match &self.state {
            ReadState::Length { filled, .. } | ReadState::Body { filled, .. } => *filled,
        }
    }

    /// Number of bytes the current phase is waiting for in total.
    pub fn target_size(&self) -> usize {
        match &self.state {
            ReadState::Length { .. } => LENGTH_PREFIX_SIZE,
            ReadState::Body { body, .. } => body.len(),
        }
    }

    /// Slice the next read should write into. Never empty.
    pub fn unfilled(&mut self) -> &mut [u8] {
        match &mut self.state {
            ReadState::Length { prefix, filled } => &mut prefix[*filled..],
            ReadState::Body { body, filled } => &mut body[*filled..],
        }
    }

    /// Record that `n` bytes were written into [`Self::unfilled`].
    ///
    /// Returns the complete package once its last byte arrives; the reader is
    /// then ready for the next frame.
    ///
    /// # Errors
    ///
    /// `FrameTooLarge` if the announced length exceeds the limit. The reader
    /// is reset and should not be reused on the same stream since framing is
    /// lost.
    pub fn advance(&mut self, n: usize) -> Result<Option<Bytes>> {
        match &mut self.state {
            ReadState::Length { prefix, filled } => {
                *filled = (*filled + n).min(LENGTH_PREFIX_SIZE);
                if *filled < LENGTH_PREFIX_SIZE {
                    return Ok(None);
                }

                let size = u64::from_le_bytes(*prefix);
                self.state = ReadState::idle();

                if size > self.max_frame_size {
                    return Err(ProtocolError::FrameTooLarge { size, max: self.max_frame_size });
                }
                let size = usize::try_from(size).map_err(|_| ProtocolError::LengthOverflow)?;

                if size == 0 {
                    return Ok(Some(Bytes::new()));
                }

                self.state = ReadState::Body { body: BytesMut::zeroed(size), filled: 0 };
                Ok(None)
            },
            ReadState::Body { body, filled } => {
                *filled = (*filled + n).min(body.len());
                if *filled < body.len() {
                    return Ok(None);
                }

                match std::mem::replace(&mut self.state, ReadState::idle()) {
                    ReadState::Body { body, .. } => Ok(Some(body.freeze())),
                    ReadState::Length { .. } => Ok(None),
                }
            },
        }
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

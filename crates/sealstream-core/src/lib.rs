//! Secure stream socket.
//!
//! A [`SecureStreamSocket`] turns any reliable, ordered byte stream into an
//! authenticated, encrypted one. Every `send` becomes one sealed package on
//! the wire behind an 8-byte length prefix; every `recv` opens one package and
//! serves its plaintext, buffering whatever the caller did not ask for.
//!
//! # Architecture
//!
//! The socket owns two [`DirectionalState`]s seeded from the same handshake
//! key pair: one for what it sends, one for what it receives. Each direction
//! authenticates message `n` with its mask key and counter `n`, and rotates
//! both keys via HKDF when its counter reaches the configured rekey limit.
//! Both peers therefore have to see every message of a direction in the same
//! order; any loss, duplication or reordering shows up as an authentication
//! failure on the next message.
//!
//! The receive side is driven by a sans-IO [`FrameReader`], so the same
//! socket serves blocking `std::io` streams and `tokio` streams, and an async
//! receive that is dropped halfway through a frame resumes on the next call.
//!
//! # Components
//!
//! - [`socket`]: the secure stream socket (sync and async)
//! - [`handshake`]: capability traits that produce the initial key pair
//! - [`transport`]: transport abstraction (streams)
//! - [`config`]: socket configuration
//! - [`error`]: socket and handshake error types
//!
//! [`DirectionalState`]: sealstream_crypto::DirectionalState
//! [`FrameReader`]: sealstream_proto::FrameReader

pub mod config;
pub mod error;
pub mod handshake;
pub mod socket;
pub mod transport;

pub use config::SocketConfig;
pub use error::{HandshakeError, Result, SocketError};
pub use handshake::{AsyncHandshake, Handshake, PresharedHandshake};
pub use socket::{ConnectionState, SecureStreamSocket};
pub use transport::{TcpTransport, Transport};

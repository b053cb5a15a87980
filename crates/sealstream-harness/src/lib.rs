//! Deterministic test harness for sealstream.
//!
//! - [`pipe`]: in-memory blocking duplex for synchronous sockets
//! - [`sim_transport`]: turmoil implementation of the core `Transport` trait,
//!   for latency and packet-loss simulation
//! - [`scenario`]: declarative two-party scenarios with mandatory oracles

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod pipe;
pub mod scenario;
pub mod sim_transport;

pub use pipe::{PipeEnd, pipe};
pub use sim_transport::SimTransport;

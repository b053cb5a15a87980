//! Scenario-based testing framework.
//!
//! A scenario wires one client socket to one server socket over an in-memory
//! [`pipe`](crate::pipe), plays a script of sends and wire faults, and hands
//! the resulting [`World`] to an oracle. The oracle is mandatory: a
//! [`Scenario`] has no `run` method until one is supplied.
//!
//! ```
//! use sealstream_harness::scenario::{Scenario, oracle};
//!
//! Scenario::new("ping pong")
//!     .client("alice")
//!     .server("hub")
//!     .send("alice", b"ping")
//!     .send("hub", b"pong")
//!     .oracle(oracle::all_of(vec![oracle::all_established(), oracle::counters_in_sync()]))
//!     .run()
//!     .unwrap();
//! ```

mod builder;
pub mod oracle;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::{ScenarioSocket, WireEvent, World};

/// Verification run against the final world.
pub type OracleFn = Box<dyn FnOnce(&World) -> Result<(), String>>;

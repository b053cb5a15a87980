//! Reusable oracles.
//!
//! Each helper returns an [`OracleFn`]; combine them with [`all_of`].

use crate::scenario::{OracleFn, World};

/// Every socket is still Established.
pub fn all_established() -> OracleFn {
    Box::new(|world: &World| {
        if world.all_established() {
            Ok(())
        } else {
            Err("not all sockets are Established".to_string())
        }
    })
}

/// Both directions agree on counter and rekey generation.
pub fn counters_in_sync() -> OracleFn {
    Box::new(|world: &World| {
        if world.counters_in_sync() {
            Ok(())
        } else {
            Err("directional counters diverged".to_string())
        }
    })
}

/// No actor recorded an error.
pub fn no_failures() -> OracleFn {
    Box::new(|world: &World| {
        for actor in world.actor_names() {
            if let Some(error) = world.failures(&actor).first() {
                return Err(format!("{actor} failed: {error}"));
            }
        }
        Ok(())
    })
}

/// `actor` received exactly `expected`, in order.
pub fn delivered(actor: impl Into<String>, expected: Vec<Vec<u8>>) -> OracleFn {
    let actor = actor.into();
    Box::new(move |world: &World| {
        let got = world.delivered(&actor);
        if got == expected.as_slice() {
            Ok(())
        } else {
            Err(format!("{actor} received {} messages, expected {}", got.len(), expected.len()))
        }
    })
}

/// `actor`'s socket ended up Failed.
pub fn failed(actor: impl Into<String>) -> OracleFn {
    let actor = actor.into();
    Box::new(move |world: &World| match world.socket(&actor) {
        Some(socket) if socket.state() == sealstream_core::ConnectionState::Failed => Ok(()),
        Some(socket) => Err(format!("{actor} is {:?}, expected Failed", socket.state())),
        None => Err(format!("{actor} not found")),
    })
}

/// Run every oracle; the first error wins.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world: &World| {
        for oracle in oracles {
            oracle(world)?;
        }
        Ok(())
    })
}

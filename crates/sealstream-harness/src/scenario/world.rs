//! World state for scenario execution.
//!
//! The World owns both sockets during scenario execution, tracks what each
//! actor sent, received and failed on, and keeps a transcript of every frame
//! that crossed the wire.

use std::collections::HashMap;

use rand_chacha::ChaCha20Rng;
use sealstream_core::{ConnectionState, SecureStreamSocket};

use crate::pipe::PipeEnd;

/// Socket type used by scenarios.
pub type ScenarioSocket = SecureStreamSocket<PipeEnd, ChaCha20Rng>;

/// Wire faults injected during scenario execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    /// A bit pattern was XORed into a frame headed for `toward`
    Tampered {
        /// Receiving actor
        toward: String,
        /// Offset within the sealed package
        offset: usize,
    },
    /// Frames headed for `toward` were discarded
    Dropped {
        /// Receiving actor
        toward: String,
        /// Number of wire bytes discarded
        bytes: usize,
    },
}

/// World state containing both sockets and per-actor records.
pub struct World {
    clients: HashMap<String, ScenarioSocket>,
    servers: HashMap<String, ScenarioSocket>,
    messages_sent: HashMap<String, usize>,
    delivered: HashMap<String, Vec<Vec<u8>>>,
    failures: HashMap<String, Vec<String>>,
    wire_events: Vec<WireEvent>,
    transcript: Vec<Vec<u8>>,
}

impl World {
    /// Create a new empty world.
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            servers: HashMap::new(),
            messages_sent: HashMap::new(),
            delivered: HashMap::new(),
            failures: HashMap::new(),
            wire_events: Vec::new(),
            transcript: Vec::new(),
        }
    }

    /// Add a client socket to the world.
    pub fn add_client(&mut self, name: String, socket: ScenarioSocket) {
        self.messages_sent.insert(name.clone(), 0);
        self.clients.insert(name, socket);
    }

    /// Add a server socket to the world.
    pub fn add_server(&mut self, name: String, socket: ScenarioSocket) {
        self.messages_sent.insert(name.clone(), 0);
        self.servers.insert(name, socket);
    }

    /// Get a client socket by name.
    pub fn client(&self, name: &str) -> Option<&ScenarioSocket> {
        self.clients.get(name)
    }

    /// Get a server socket by name.
    pub fn server(&self, name: &str) -> Option<&ScenarioSocket> {
        self.servers.get(name)
    }

    /// Get any actor's socket by name.
    pub fn socket(&self, name: &str) -> Option<&ScenarioSocket> {
        self.clients.get(name).or_else(|| self.servers.get(name))
    }

    /// Get any actor's socket mutably by name.
    pub fn socket_mut(&mut self, name: &str) -> Option<&mut ScenarioSocket> {
        match self.clients.get_mut(name) {
            Some(socket) => Some(socket),
            None => self.servers.get_mut(name),
        }
    }

    /// Record that an actor sent a message.
    pub fn record_sent(&mut self, actor: &str) {
        *self.messages_sent.entry(actor.to_string()).or_insert(0) += 1;
    }

    /// Record plaintext an actor received.
    pub fn record_delivered(&mut self, actor: &str, message: Vec<u8>) {
        self.delivered.entry(actor.to_string()).or_default().push(message);
    }

    /// Record an error an actor hit.
    pub fn record_failure(&mut self, actor: &str, error: String) {
        self.failures.entry(actor.to_string()).or_default().push(error);
    }

    /// Record a wire fault.
    pub fn record_wire_event(&mut self, event: WireEvent) {
        self.wire_events.push(event);
    }

    /// Record a frame as it was about to be read.
    pub fn record_frame(&mut self, frame: Vec<u8>) {
        self.transcript.push(frame);
    }

    /// Number of messages an actor sent successfully.
    pub fn messages_sent(&self, actor: &str) -> usize {
        self.messages_sent.get(actor).copied().unwrap_or(0)
    }

    /// Messages an actor received, in order.
    pub fn delivered(&self, actor: &str) -> &[Vec<u8>] {
        self.delivered.get(actor).map(Vec::as_slice).unwrap_or_default()
    }

    /// Errors an actor hit, in order.
    pub fn failures(&self, actor: &str) -> &[String] {
        self.failures.get(actor).map(Vec::as_slice).unwrap_or_default()
    }

    /// All wire faults injected.
    pub fn wire_events(&self) -> &[WireEvent] {
        &self.wire_events
    }

    /// Every frame that crossed the wire, in order, with length prefix.
    pub fn transcript(&self) -> &[Vec<u8>] {
        &self.transcript
    }

    /// Check if every socket is still Established.
    pub fn all_established(&self) -> bool {
        self.clients
            .values()
            .chain(self.servers.values())
            .all(|s| s.state() == ConnectionState::Established)
    }

    /// Check that each client/server pair agrees on both directions.
    ///
    /// A client's send side must match the server's receive side (counter
    /// and rekey generation), and the other way round.
    pub fn counters_in_sync(&self) -> bool {
        self.clients.values().all(|client| {
            self.servers.values().all(|server| {
                client.send_counter() == server.recv_counter()
                    && client.send_generation() == server.recv_generation()
                    && server.send_counter() == client.recv_counter()
                    && server.send_generation() == client.recv_generation()
            })
        })
    }

    /// Get all actor names (clients and servers).
    pub fn actor_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        names.extend(self.clients.keys().cloned());
        names.extend(self.servers.keys().cloned());
        names
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

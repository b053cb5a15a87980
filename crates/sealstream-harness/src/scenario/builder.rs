//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sealstream_core::{PresharedHandshake, SecureStreamSocket, SocketConfig};
use sealstream_proto::frame::LENGTH_PREFIX_SIZE;
use tracing::debug;

use crate::{
    pipe::pipe,
    scenario::{OracleFn, WireEvent, World},
};

#[derive(Debug, Clone)]
enum Step {
    Send { from: String, data: Vec<u8> },
    Tamper { toward: String, offset: usize, mask: u8 },
    DropInFlight { toward: String },
}

/// Scenario builder.
///
/// Construct a scenario by adding one client, one server and a script of
/// sends and wire faults. Must call `.oracle()` to get a RunnableScenario
/// that can be executed.
///
/// Frames are delivered lazily: everything in flight is read by its
/// recipient right before the next `send` step and once more at the end.
/// Faults placed after a `send` therefore hit that send's frame.
pub struct Scenario {
    name: String,
    clients: Vec<String>,
    servers: Vec<String>,
    config: SocketConfig,
    seed: u64,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clients: Vec::new(),
            servers: Vec::new(),
            config: SocketConfig::default(),
            seed: 0,
            steps: Vec::new(),
        }
    }

    /// Add a client actor to the scenario.
    pub fn client(mut self, name: impl Into<String>) -> Self {
        self.clients.push(name.into());
        self
    }

    /// Add a server actor to the scenario.
    pub fn server(mut self, name: impl Into<String>) -> Self {
        self.servers.push(name.into());
        self
    }

    /// Socket configuration shared by both actors.
    pub fn config(mut self, config: SocketConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed for the key pair and both sockets' IV generators.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `from` sends `data` to its peer.
    pub fn send(mut self, from: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.steps.push(Step::Send { from: from.into(), data: data.into() });
        self
    }

    /// XOR `mask` into byte `offset` of the sealed package in flight towards
    /// `toward`. Offsets past the package are ignored.
    pub fn tamper(mut self, toward: impl Into<String>, offset: usize, mask: u8) -> Self {
        self.steps.push(Step::Tamper { toward: toward.into(), offset, mask });
        self
    }

    /// Discard everything in flight towards `toward`.
    pub fn drop_in_flight(mut self, toward: impl Into<String>) -> Self {
        self.steps.push(Step::DropInFlight { toward: toward.into() });
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// Both sockets are seeded from one generated key pair, the script is
    /// played step by step, and the oracle is invoked on the final world.
    /// Socket errors during the script are recorded in the world, not
    /// returned; only setup problems and oracle failures are.
    pub fn run(self) -> Result<(), String> {
        let Self { scenario, oracle } = self;
        let name = scenario.name;

        // Each pipe carries exactly one client/server connection.
        let (client_name, server_name) = match (scenario.clients.as_slice(), scenario.servers.as_slice()) {
            ([client], [server]) => (client.clone(), server.clone()),
            (clients, servers) => {
                return Err(format!(
                    "Scenario '{}': only 1 client and 1 server are supported (got {} clients, {} servers)",
                    name,
                    clients.len(),
                    servers.len()
                ));
            },
        };

        let mut key_rng = ChaCha20Rng::seed_from_u64(scenario.seed);
        let handshake = PresharedHandshake::generate(scenario.config.key_size, &mut key_rng);
        let (client_end, server_end) = pipe();

        let client = SecureStreamSocket::from_handshake(
            handshake.clone(),
            client_end,
            ChaCha20Rng::seed_from_u64(scenario.seed.wrapping_add(1)),
            scenario.config.clone(),
        )
        .map_err(|e| format!("Scenario '{name}': client {client_name} setup failed: {e}"))?;

        let server = SecureStreamSocket::from_handshake(
            handshake,
            server_end,
            ChaCha20Rng::seed_from_u64(scenario.seed.wrapping_add(2)),
            scenario.config,
        )
        .map_err(|e| format!("Scenario '{name}': server {server_name} setup failed: {e}"))?;

        let mut world = World::new();
        world.add_client(client_name.clone(), client);
        world.add_server(server_name.clone(), server);
        let actors = [client_name, server_name];

        for step in scenario.steps {
            match step {
                Step::Send { from, data } => {
                    if !actors.contains(&from) {
                        return Err(format!("Scenario '{name}': unknown actor {from}"));
                    }

                    deliver_all(&mut world, &actors);

                    let socket = world
                        .socket_mut(&from)
                        .ok_or_else(|| format!("Scenario '{name}': actor {from} not found"))?;
                    match socket.send(&data) {
                        Ok(_) => world.record_sent(&from),
                        Err(e) => world.record_failure(&from, e.to_string()),
                    }
                },
                Step::Tamper { toward, offset, mask } => {
                    let socket = world
                        .socket(&toward)
                        .ok_or_else(|| format!("Scenario '{name}': actor {toward} not found"))?;
                    if socket.get_ref().tamper(LENGTH_PREFIX_SIZE + offset, mask) {
                        world.record_wire_event(WireEvent::Tampered { toward, offset });
                    }
                },
                Step::DropInFlight { toward } => {
                    let socket = world
                        .socket(&toward)
                        .ok_or_else(|| format!("Scenario '{name}': actor {toward} not found"))?;
                    let bytes = socket.get_ref().drop_pending();

                    world.record_wire_event(WireEvent::Dropped { toward, bytes });
                },
            }
        }

        deliver_all(&mut world, &actors);

        oracle(&world)
    }
}

/// Let every actor read whatever is in flight towards it.
///
/// At most one frame is ever in flight: each send step delivers first.
fn deliver_all(world: &mut World, actors: &[String]) {
    for actor in actors {
        let Some(socket) = world.socket_mut(actor) else {
            continue;
        };

        let frame = socket.get_ref().pending();
        if frame.is_empty() {
            continue;
        }

        let result = socket.recv(usize::MAX);
        world.record_frame(frame);

        match result {
            Ok(bytes) => {
                debug!(actor = %actor, len = bytes.len(), "delivered");
                world.record_delivered(actor, bytes.to_vec());
            },
            Err(e) => {
                // Leave nothing behind for the next delivery.
                if let Some(socket) = world.socket(actor) {
                    socket.get_ref().drop_pending();
                }
                world.record_failure(actor, e.to_string());
            },
        }
    }
}

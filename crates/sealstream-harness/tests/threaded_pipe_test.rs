//! Blocking sockets on separate threads over the in-memory pipe.

use std::thread;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sealstream_core::{PresharedHandshake, SecureStreamSocket, SocketConfig, SocketError};
use sealstream_crypto::KeySize;
use sealstream_harness::{PipeEnd, pipe};

type PipeSocket = SecureStreamSocket<PipeEnd, ChaCha20Rng>;

fn connected(config: &SocketConfig, seed: u64) -> (PipeSocket, PipeSocket) {
    let handshake =
        PresharedHandshake::generate(config.key_size, &mut ChaCha20Rng::seed_from_u64(seed));
    let (a, b) = pipe();

    let client = SecureStreamSocket::from_handshake(
        handshake.clone(),
        a,
        ChaCha20Rng::seed_from_u64(seed + 1),
        config.clone(),
    )
    .unwrap();
    let server = SecureStreamSocket::from_handshake(
        handshake,
        b,
        ChaCha20Rng::seed_from_u64(seed + 2),
        config.clone(),
    )
    .unwrap();
    (client, server)
}

/// Read exactly `len` plaintext bytes, however they are framed.
fn recv_exact(socket: &mut PipeSocket, len: usize) -> Result<Vec<u8>, SocketError> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        out.extend_from_slice(&socket.recv(len - out.len())?);
    }
    Ok(out)
}

#[test]
fn echo_server_on_another_thread() {
    let config = SocketConfig { rekey_limit: 7, ..SocketConfig::default() };
    let (mut client, mut server) = connected(&config, 10);

    let echo = thread::spawn(move || -> Result<u64, SocketError> {
        loop {
            let message = server.recv(usize::MAX)?;
            if message.is_empty() {
                return Ok(server.recv_generation());
            }
            server.send(&message)?;
        }
    });

    for i in 1..=50u16 {
        let message: Vec<u8> = (0..i * 13).map(|b| b as u8).collect();
        client.send(&message).unwrap();
        assert_eq!(recv_exact(&mut client, message.len()).unwrap(), message);
    }
    client.send(&[]).unwrap();

    // 51 messages at 8 per generation.
    assert_eq!(echo.join().unwrap().unwrap(), 6);
    assert_eq!(client.send_generation(), 6);
    assert_eq!(client.recv_generation(), 6);
}

#[test]
fn full_duplex_streaming() {
    let config = SocketConfig { key_size: KeySize::Aes256, rekey_limit: 2, ..SocketConfig::default() };
    let (client, server) = connected(&config, 20);

    // Each side writes a burst and reads the peer's burst. Pipe writes never
    // block, so both can send first.
    let run = |mut socket: PipeSocket, tag: u8| {
        thread::spawn(move || -> Result<Vec<u8>, SocketError> {
            for i in 0..30u8 {
                socket.send(&[tag, i])?;
            }
            recv_exact(&mut socket, 60)
        })
    };

    let client = run(client, b'c');
    let server = run(server, b's');
    let from_server = client.join().unwrap().unwrap();
    let from_client = server.join().unwrap().unwrap();

    let expected = |tag: u8| (0..30u8).flat_map(|i| [tag, i]).collect::<Vec<u8>>();
    assert_eq!(from_server, expected(b's'));
    assert_eq!(from_client, expected(b'c'));
}

#[test]
fn peer_hang_up_is_an_io_error() {
    let (client, mut server) = connected(&SocketConfig::default(), 30);
    drop(client);

    let result = server.recv(16);
    assert!(matches!(result, Err(SocketError::Io(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn chunked_reads_reassemble_stream(
        messages in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..500), 1..10),
        read_size in 1usize..97,
        rekey_limit in 0u64..3,
    ) {
        let config = SocketConfig { rekey_limit, ..SocketConfig::default() };
        let (mut client, mut server) = connected(&config, 40);

        let mut expected = Vec::new();
        for message in &messages {
            client.send(message).unwrap();
            expected.extend_from_slice(message);
        }

        let mut received = Vec::new();
        while received.len() < expected.len() {
            received.extend_from_slice(&server.recv(read_size).unwrap());
        }

        prop_assert_eq!(received, expected);
    }
}

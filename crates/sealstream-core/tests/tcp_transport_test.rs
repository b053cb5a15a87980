//! Secure sockets over real loopback TCP.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sealstream_core::{
    ConnectionState, PresharedHandshake, SecureStreamSocket, SocketConfig, TcpTransport, Transport,
};
use sealstream_crypto::{KeySize, SymmetricKey};

#[tokio::test]
async fn loopback_exchange() {
    let server = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let handshake = PresharedHandshake::generate(KeySize::Aes128, &mut ChaCha20Rng::seed_from_u64(5));

    let server_handshake = handshake.clone();
    let accept = async move {
        let stream = server.accept().await.unwrap();
        let mut socket = SecureStreamSocket::from_handshake_async(
            server_handshake,
            stream,
            ChaCha20Rng::seed_from_u64(2),
            SocketConfig::default(),
        )
        .await
        .unwrap();

        let request = socket.recv_async(1024).await.unwrap();
        socket.send_async(&request.repeat(2)).await.unwrap();
        socket
    };

    let connect = async {
        let stream = TcpTransport::client().connect(&addr).await.unwrap();
        let mut socket = SecureStreamSocket::from_handshake_async(
            handshake,
            stream,
            ChaCha20Rng::seed_from_u64(1),
            SocketConfig::default(),
        )
        .await
        .unwrap();

        socket.send_async(b"hello ").await.unwrap();
        let reply = socket.recv_async(1024).await.unwrap();
        assert_eq!(&reply[..], b"hello hello ");
        socket
    };

    let (server, client) = tokio::join!(accept, connect);
    assert_eq!(server.state(), ConnectionState::Established);
    assert_eq!(client.send_counter(), 1);
    assert_eq!(client.recv_counter(), 1);
}

#[tokio::test]
async fn unbound_transport_cannot_accept() {
    let transport = TcpTransport::client();
    assert!(transport.accept().await.is_err());
    assert!(transport.local_addr().is_err());
}

#[tokio::test]
async fn mismatched_keys_fail_on_first_message() {
    let server = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap().to_string();

    let accept = async move {
        let stream = server.accept().await.unwrap();
        let mut socket = SecureStreamSocket::new(
            SymmetricKey::from([0u8; 16]),
            SymmetricKey::from([2u8; 16]),
            stream,
            ChaCha20Rng::seed_from_u64(2),
            SocketConfig::default(),
        )
        .unwrap();

        let result = socket.recv_async(64).await;
        (result.is_err(), socket.state())
    };

    let connect = async {
        let stream = TcpTransport::client().connect(&addr).await.unwrap();
        let mut socket = SecureStreamSocket::new(
            SymmetricKey::from([0u8; 16]),
            SymmetricKey::from([1u8; 16]),
            stream,
            ChaCha20Rng::seed_from_u64(1),
            SocketConfig::default(),
        )
        .unwrap();
        socket.send_async(b"masked differently").await.unwrap();
        socket
    };

    let ((failed, state), _client) = tokio::join!(accept, connect);
    assert!(failed);
    assert_eq!(state, ConnectionState::Failed);
}

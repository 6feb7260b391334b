//! End-to-end stream codec integration tests.

use std::sync::Arc;

use rand::{Rng, RngCore};
use umbra_crypto::{CryptoError, Descriptor, Method, SaltFilter, StreamDecryptor, StreamEncryptor};

#[test]
fn full_duplex_client_server_session() {
    // 1. Both ends derive the same descriptor from the shared password.
    let client_side = Descriptor::from_name("chacha20-ietf-poly1305", b"hunter2").unwrap();
    let server_side = Descriptor::from_name("chacha20-ietf-poly1305", b"hunter2").unwrap();
    let filter = Arc::new(SaltFilter::new());

    // 2. Client opens a connection: one context per direction.
    let mut client_tx = StreamEncryptor::new(&client_side).unwrap();
    let mut client_rx = StreamDecryptor::new(&client_side);

    // 3. Server accepts: its inbound context vets salts.
    let mut server_rx = StreamDecryptor::with_replay_filter(&server_side, Arc::clone(&filter));
    let mut server_tx = StreamEncryptor::new(&server_side).unwrap();

    // 4. Request flows client -> server.
    let request = b"GET / HTTP/1.1\r\nHost: example.net\r\n\r\n";
    let wire = client_tx.encrypt(request).unwrap();
    assert_eq!(server_rx.decrypt(&wire).unwrap().unwrap(), request);

    // 5. Response flows server -> client on the independent direction.
    let response = b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok";
    let wire = server_tx.encrypt(response).unwrap();
    assert_eq!(client_rx.decrypt(&wire).unwrap().unwrap(), response);

    // 6. More traffic keeps flowing without re-sending salts.
    for round in 0..10u8 {
        let body = vec![round; 100];
        let wire = client_tx.encrypt(&body).unwrap();
        assert!(wire.len() < body.len() + 64, "salt must not repeat");
        assert_eq!(server_rx.decrypt(&wire).unwrap().unwrap(), body);
    }
}

#[test]
fn random_fragmentation_roundtrip_every_method() {
    let mut rng = rand::thread_rng();

    for method in Method::ALL {
        let descriptor = Descriptor::new(method, b"fragmentation").unwrap();
        let mut enc = StreamEncryptor::new(&descriptor).unwrap();
        let mut dec = StreamDecryptor::new(&descriptor);

        let mut plaintext = vec![0u8; 20_000];
        rng.fill_bytes(&mut plaintext);

        // Encrypt in randomly sized writes.
        let mut wire = Vec::new();
        let mut offset = 0;
        while offset < plaintext.len() {
            let take = rng.gen_range(1..=4096.min(plaintext.len() - offset));
            wire.extend(enc.encrypt(&plaintext[offset..offset + take]).unwrap());
            offset += take;
        }

        // Deliver in randomly sized reads.
        let mut recovered = Vec::new();
        let mut offset = 0;
        while offset < wire.len() {
            let take = rng.gen_range(1..=1500.min(wire.len() - offset));
            if let Some(chunk) = dec.decrypt(&wire[offset..offset + take]).unwrap() {
                recovered.extend_from_slice(&chunk);
            }
            offset += take;
        }
        assert_eq!(recovered, plaintext, "{method}");
    }
}

#[test]
fn maximum_chunk_wire_size() {
    let descriptor = Descriptor::from_name("chacha20-ietf-poly1305", b"test").unwrap();
    let mut enc = StreamEncryptor::new(&descriptor).unwrap();
    let mut dec = StreamDecryptor::new(&descriptor);

    let plaintext = vec![0x55u8; 0x3FFF];
    let wire = enc.encrypt(&plaintext).unwrap();
    assert_eq!(wire.len(), 16437);
    assert_eq!(dec.decrypt(&wire).unwrap().unwrap(), plaintext);
}

#[test]
fn wrong_password_fails_authentication() {
    let good = Descriptor::new(Method::Aes256Gcm, b"correct").unwrap();
    let bad = Descriptor::new(Method::Aes256Gcm, b"incorrect").unwrap();

    let mut enc = StreamEncryptor::new(&good).unwrap();
    let wire = enc.encrypt(b"secret").unwrap();

    let mut dec = StreamDecryptor::new(&bad);
    assert!(matches!(
        dec.decrypt(&wire),
        Err(CryptoError::Authentication)
    ));
}

#[test]
fn reordered_chunks_fail_authentication() {
    let descriptor = Descriptor::new(Method::Aes128Gcm, b"ordering").unwrap();
    let mut enc = StreamEncryptor::new(&descriptor).unwrap();

    let salt_len = descriptor.method().salt_len();
    let first = enc.encrypt(b"aaaa").unwrap();
    let second = enc.encrypt(b"bbbb").unwrap();

    // Deliver the second chunk first: the nonce sequence no longer
    // matches and verification must fail immediately.
    let mut wire = first[..salt_len].to_vec();
    wire.extend_from_slice(&second);
    wire.extend_from_slice(&first[salt_len..]);

    let mut dec = StreamDecryptor::new(&descriptor);
    assert!(matches!(
        dec.decrypt(&wire),
        Err(CryptoError::Authentication)
    ));
}

#[test]
fn server_filter_shared_across_connections() {
    let descriptor = Descriptor::new(Method::Aes128Gcm, b"shared").unwrap();
    let filter = Arc::new(SaltFilter::new());

    // Ten distinct connections all pass.
    let mut captured = Vec::new();
    for i in 0..10u8 {
        let mut enc = StreamEncryptor::new(&descriptor).unwrap();
        let wire = enc.encrypt(&[i; 32]).unwrap();
        let mut dec = StreamDecryptor::with_replay_filter(&descriptor, Arc::clone(&filter));
        assert_eq!(dec.decrypt(&wire).unwrap().unwrap(), [i; 32]);
        captured.push(wire);
    }
    assert_eq!(filter.observed().unwrap(), 10);

    // Any captured stream replayed against any fresh context is refused.
    for wire in &captured {
        let mut dec = StreamDecryptor::with_replay_filter(&descriptor, Arc::clone(&filter));
        assert!(matches!(
            dec.decrypt(wire),
            Err(CryptoError::ReplayDetected)
        ));
    }
}

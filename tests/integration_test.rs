// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! End-to-end round trips between two `EncryptedSocket`s on `127.0.0.1`,
//! covering the scenarios spec.md §8 describes.

use pixelwire_image::CoverSource;
use pixelwire_net::{EncryptedSocket, EncryptedSocketConfig, SocketError};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

async fn connected_pair() -> (EncryptedSocket, EncryptedSocket) {
    let a_sender_accept = free_port();
    let a_receiver_accept = free_port();
    let b_sender_accept = free_port();
    let b_receiver_accept = free_port();

    let config_a = EncryptedSocketConfig::new("127.0.0.1").with_ports(
        b_receiver_accept,
        a_sender_accept,
        b_sender_accept,
        a_receiver_accept,
    );
    let config_b = EncryptedSocketConfig::new("127.0.0.1").with_ports(
        a_receiver_accept,
        b_sender_accept,
        a_sender_accept,
        b_receiver_accept,
    );

    let a = EncryptedSocket::new(config_a, CoverSource::disabled());
    let b = EncryptedSocket::new(config_b, CoverSource::disabled());
    tokio::try_join!(a.connect(), b.connect()).unwrap();
    (a, b)
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

#[tokio::test]
async fn scenario_empty_string() {
    let (a, b) = connected_pair().await;
    a.send(utf16le("")).unwrap();
    assert_eq!(b.receive().await.unwrap(), utf16le(""));
    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn scenario_ascii() {
    let (a, b) = connected_pair().await;
    a.send(utf16le("hello")).unwrap();
    assert_eq!(b.receive().await.unwrap(), utf16le("hello"));
    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn scenario_unicode() {
    let (a, b) = connected_pair().await;
    let payload = utf16le("h\u{00e9}llo \u{1f600}");
    a.send(payload.clone()).unwrap();
    assert_eq!(b.receive().await.unwrap(), payload);
    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn scenario_near_max_size() {
    let (a, b) = connected_pair().await;
    // Exactly at the library's LSB capacity boundary for the default
    // 640x480 cover; MAX_CONTENT_LENGTH itself is odd so this is the
    // largest even-length payload the clamp never truncates.
    let payload = utf16le(&"x".repeat((pixelwire_image::MAX_CONTENT_LENGTH - 1) / 2));
    assert_eq!(payload.len(), pixelwire_image::MAX_CONTENT_LENGTH - 1);

    a.send(payload.clone()).unwrap();
    assert_eq!(b.receive().await.unwrap(), payload);
    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn scenario_oversize_clamp() {
    let (a, b) = connected_pair().await;
    let oversized = utf16le(&"x".repeat(100_000));
    assert!(oversized.len() > pixelwire_image::MAX_CONTENT_LENGTH);

    a.send(oversized.clone()).unwrap();
    let received = b.receive().await.unwrap();
    assert_eq!(received, &oversized[..pixelwire_image::MAX_CONTENT_LENGTH - 1]);
    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn scenario_close_mid_wait() {
    let (a, b) = connected_pair().await;

    let waiter = tokio::spawn(async move { b.receive().await });

    a.close().await;
    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(err, SocketError::NotConnected));
}

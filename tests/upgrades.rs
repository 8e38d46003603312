//! Protocol upgrades through an authenticated proxy.

use std::time::Duration;

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use base64::{engine::general_purpose, Engine};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

/// Switch to `protocol` and echo every byte back.
async fn echo_upstream(protocol: &'static str) -> std::net::SocketAddr {
    let handler = move |mut request: Request| async move {
        let on_upgrade = hyper::upgrade::on(&mut request);
        tokio::spawn(async move {
            if let Ok(upgraded) = on_upgrade.await {
                let (mut reader, mut writer) = tokio::io::split(TokioIo::new(upgraded));
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            }
        });

        Response::builder()
            .status(StatusCode::SWITCHING_PROTOCOLS)
            .header(header::CONNECTION, "upgrade")
            .header(header::UPGRADE, protocol)
            .body(Body::empty())
            .unwrap()
    };

    common::spawn_upstream(Router::new().route("/chat", get(handler))).await
}

async fn send_upgrade(stream: &mut TcpStream, protocol: &str) -> String {
    let credentials = general_purpose::STANDARD.encode("alice:wonderland");
    let request = format!(
        "GET /chat HTTP/1.1\r\nHost: proxy\r\nAuthorization: Basic {}\r\nConnection: Upgrade\r\nUpgrade: {}\r\n\r\n",
        credentials, protocol
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    // Read byte by byte so nothing past the head is consumed.
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).await.unwrap();
        head.push(byte[0]);
    }
    String::from_utf8(head).unwrap()
}

#[tokio::test]
async fn test_upgrade_is_spliced_through() {
    let backend = echo_upstream("echo").await;
    let proxy = common::start_proxy(common::config_for(backend, &[("alice", "wonderland")])).await;

    let mut stream = TcpStream::connect(proxy.addr).await.unwrap();
    let head = tokio::time::timeout(Duration::from_secs(5), send_upgrade(&mut stream, "echo"))
        .await
        .expect("no switching response");

    assert!(head.starts_with("HTTP/1.1 101"), "unexpected head: {}", head);
    assert!(head.to_ascii_lowercase().contains("upgrade: echo"));

    stream.write_all(b"ping").await.unwrap();
    let mut echoed = [0u8; 4];
    tokio::time::timeout(Duration::from_secs(5), stream.read_exact(&mut echoed))
        .await
        .expect("no echo")
        .unwrap();
    assert_eq!(&echoed, b"ping");

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_mismatched_upgrade_is_bad_gateway() {
    let backend = echo_upstream("something-else").await;
    let proxy = common::start_proxy(common::config_for(backend, &[("alice", "wonderland")])).await;

    let mut stream = TcpStream::connect(proxy.addr).await.unwrap();
    let head = tokio::time::timeout(Duration::from_secs(5), send_upgrade(&mut stream, "echo"))
        .await
        .expect("no response");

    assert!(head.starts_with("HTTP/1.1 502"), "unexpected head: {}", head);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_upgrade_requires_credentials() {
    let backend = echo_upstream("echo").await;
    let proxy = common::start_proxy(common::config_for(backend, &[("bob", "builder")])).await;

    let mut stream = TcpStream::connect(proxy.addr).await.unwrap();
    let head = tokio::time::timeout(Duration::from_secs(5), send_upgrade(&mut stream, "echo"))
        .await
        .expect("no response");

    assert!(head.starts_with("HTTP/1.1 401"), "unexpected head: {}", head);

    proxy.shutdown.trigger();
}

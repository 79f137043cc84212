mod common;

use common::{MemoryArticles, MemoryCache, harness};
use std::sync::Arc;
use std::time::Duration;
use tandem::service::lifecycle::{DrainOutcome, serve_with_drain};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, oneshot};

#[tokio::test]
async fn idle_server_drains_immediately() {
    let h = harness(MemoryArticles::seeded(), MemoryCache::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let outcome = serve_with_drain(listener, h.app, async {}, Duration::from_secs(10))
        .await
        .expect("serve should stop cleanly");
    assert_eq!(outcome, DrainOutcome::Drained);
}

#[tokio::test]
async fn requests_are_served_until_shutdown() {
    let h = harness(MemoryArticles::seeded(), MemoryCache::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve_with_drain(
        listener,
        h.app,
        async {
            let _ = stop_rx.await;
        },
        Duration::from_secs(10),
    ));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    assert!(raw.contains(r#"{"mysql":"connected","redis":"connected"}"#));

    stop_tx.send(()).unwrap();
    let outcome = server.await.unwrap().unwrap();
    assert_eq!(outcome, DrainOutcome::Drained);
}

#[tokio::test]
async fn drain_deadline_bounds_shutdown() {
    let started = Arc::new(Notify::new());
    let articles = MemoryArticles {
        delay: Some(Duration::from_secs(3)),
        started: Some(started.clone()),
        ..MemoryArticles::seeded()
    };
    let h = harness(articles, MemoryCache::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve_with_drain(
        listener,
        h.app,
        async {
            let _ = stop_rx.await;
        },
        Duration::from_millis(200),
    ));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /articles HTTP/1.1\r\nhost: localhost\r\n\r\n")
        .await
        .unwrap();
    started.notified().await;

    let begun = std::time::Instant::now();
    stop_tx.send(()).unwrap();
    let outcome = server.await.unwrap().unwrap();
    assert_eq!(outcome, DrainOutcome::DeadlineElapsed);
    assert!(begun.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn in_flight_request_completes_during_drain() {
    let started = Arc::new(Notify::new());
    let articles = MemoryArticles {
        delay: Some(Duration::from_secs(1)),
        started: Some(started.clone()),
        ..MemoryArticles::seeded()
    };
    let h = harness(articles, MemoryCache::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(serve_with_drain(
        listener,
        h.app,
        async {
            let _ = stop_rx.await;
        },
        Duration::from_secs(10),
    ));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /articles HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    started.notified().await;
    stop_tx.send(()).unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    assert!(raw.contains(r#""id":"a-new""#));

    let outcome = server.await.unwrap().unwrap();
    assert_eq!(outcome, DrainOutcome::Drained);
}

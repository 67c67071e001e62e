//! Integration test: boots an in-process WebSocket server that plays the
//! orchestrator, plus an in-process HTTP site to crawl, and drives a real
//! [`NodeAgent`] through registration, crawl jobs, heartbeats and
//! reconnects.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use sentinel_domain::config::FetchConfig;
use sentinel_node_sdk::{LinkStatus, NodeAgent, NodeAgentBuilder, NodeIdentity, WsMessage};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

// ── Site to crawl ───────────────────────────────────────────────────────

async fn start_site() -> SocketAddr {
    let app = Router::new()
        .route("/ok", get(|| async { "hi" }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "no such page") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(800)).await;
                "slow"
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A URL on a port nobody listens on.
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/ok")
}

// ── Mini orchestrator: in-process WS server ─────────────────────────────

/// Handle to one accepted node connection.  Dropping it closes the
/// connection from the orchestrator side.
struct OrchestratorConn {
    /// First message the node sent.
    register: WsMessage,
    /// Raw text frames to push to the node.
    send: mpsc::Sender<String>,
    /// Everything else the node sends.
    recv: mpsc::Receiver<WsMessage>,
}

async fn start_orchestrator() -> (SocketAddr, mpsc::Receiver<OrchestratorConn>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (addr, serve_orchestrator(listener))
}

fn serve_orchestrator(listener: TcpListener) -> mpsc::Receiver<OrchestratorConn> {
    let (conn_tx, conn_rx) = mpsc::channel(4);

    tokio::spawn(async move {
        while let Ok((stream, _peer)) = listener.accept().await {
            let conn_tx = conn_tx.clone();
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let (mut sink, mut stream) = ws.split();

                let register = loop {
                    match stream.next().await {
                        Some(Ok(Message::Text(text))) => {
                            if let Ok(msg) = serde_json::from_str::<WsMessage>(&text) {
                                break msg;
                            }
                        }
                        Some(Ok(_)) => continue,
                        _ => return,
                    }
                };

                let (push_tx, mut push_rx) = mpsc::channel::<String>(16);
                let (from_node_tx, from_node_rx) = mpsc::channel::<WsMessage>(64);

                let conn = OrchestratorConn {
                    register,
                    send: push_tx,
                    recv: from_node_rx,
                };
                if conn_tx.send(conn).await.is_err() {
                    return;
                }

                let read_task = tokio::spawn(async move {
                    while let Some(Ok(msg)) = stream.next().await {
                        if let Message::Text(text) = msg {
                            if let Ok(ws_msg) = serde_json::from_str::<WsMessage>(&text) {
                                let _ = from_node_tx.send(ws_msg).await;
                            }
                        }
                    }
                });

                let write_task = tokio::spawn(async move {
                    while let Some(text) = push_rx.recv().await {
                        if sink.send(Message::Text(text)).await.is_err() {
                            return;
                        }
                    }
                    // Test dropped the handle: hang up.
                    let _ = sink.close().await;
                });

                let _ = tokio::join!(read_task, write_task);
            });
        }
    });

    conn_rx
}

impl OrchestratorConn {
    /// Wait for the next message matching `pred`, skipping the rest.
    async fn next_matching(&mut self, pred: impl Fn(&WsMessage) -> bool) -> WsMessage {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            match tokio::time::timeout_at(deadline, self.recv.recv()).await {
                Ok(Some(msg)) if pred(&msg) => return msg,
                Ok(Some(_)) => continue,
                Ok(None) => panic!("connection dropped while waiting"),
                Err(_) => panic!("timeout waiting for message"),
            }
        }
    }

    async fn push(&self, text: impl Into<String>) {
        self.send.send(text.into()).await.unwrap();
    }

    /// Dispatch a crawl job without waiting.
    async fn request_crawl(&self, job_id: &str, url: &str) {
        let req = serde_json::json!({
            "type": "crawl_request",
            "job_id": job_id,
            "url": url,
            "timestamp": "2024-05-01T12:00:00",
        });
        self.push(req.to_string()).await;
    }

    /// Dispatch a crawl job and wait for its result or error.
    async fn crawl(&mut self, job_id: &str, url: &str) -> WsMessage {
        self.request_crawl(job_id, url).await;
        self.next_matching(|m| m.job_id() == Some(job_id)).await
    }
}

fn agent(orchestrator: SocketAddr, reconnect: Duration, keepalive: Duration) -> NodeAgent {
    NodeAgentBuilder::new()
        .orchestrator_url(format!("ws://{orchestrator}/ws/crawler"))
        .identity(NodeIdentity::with_id("integration-node", ["http", "browser"]))
        .reconnect_delay(reconnect)
        .keepalive_period(keepalive)
        .fetch(FetchConfig {
            timeout_secs: Some(5),
            ..Default::default()
        })
        .build()
        .unwrap()
}

async fn next_conn(conn_rx: &mut mpsc::Receiver<OrchestratorConn>) -> OrchestratorConn {
    tokio::time::timeout(WAIT, conn_rx.recv())
        .await
        .expect("timeout waiting for node connection")
        .expect("orchestrator stopped")
}

// ── Tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_crawl_and_heartbeat() {
    let site = start_site().await;
    let (addr, mut conn_rx) = start_orchestrator().await;

    let agent = agent(addr, Duration::from_millis(100), Duration::from_millis(200));
    let mut status = agent.status();
    let shutdown = CancellationToken::new();
    let handle = agent.spawn(shutdown.clone());

    let mut conn = next_conn(&mut conn_rx).await;

    // ── Registration ─────────────────────────────────────────────────
    assert_eq!(
        conn.register,
        WsMessage::Register {
            node_id: "integration-node".into(),
            capabilities: vec!["http".into(), "browser".into()],
        }
    );
    tokio::time::timeout(WAIT, status.wait_for(|s| *s == LinkStatus::Connected))
        .await
        .expect("status never became connected")
        .unwrap();

    // ── 200 → crawl_result ───────────────────────────────────────────
    let ok_url = format!("http://{site}/ok");
    match conn.crawl("j1", &ok_url).await {
        WsMessage::CrawlResult {
            job_id,
            url,
            status,
            body,
            node_id,
        } => {
            assert_eq!(job_id, "j1");
            assert_eq!(url, ok_url);
            assert_eq!(status, 200);
            assert_eq!(body, "hi");
            assert_eq!(node_id, "integration-node");
        }
        other => panic!("expected CrawlResult, got: {other:?}"),
    }

    // ── 404 is still a successful crawl ──────────────────────────────
    match conn.crawl("j2", &format!("http://{site}/missing")).await {
        WsMessage::CrawlResult { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such page");
        }
        other => panic!("expected CrawlResult, got: {other:?}"),
    }

    // ── Unreachable host → crawl_error ───────────────────────────────
    let dead = unreachable_url();
    match conn.crawl("j3", &dead).await {
        WsMessage::CrawlError {
            job_id,
            url,
            error,
            node_id,
        } => {
            assert_eq!(job_id, "j3");
            assert_eq!(url, dead);
            assert!(!error.is_empty());
            assert_eq!(node_id, "integration-node");
        }
        other => panic!("expected CrawlError, got: {other:?}"),
    }

    // ── Junk frames leave the connection usable ──────────────────────
    conn.push("{definitely not json").await;
    conn.push(r#"{"type":"reconfigure","depth":3}"#).await;
    conn.push(r#"{"type":"crawl_request"}"#).await;
    match conn.crawl("j4", &ok_url).await {
        WsMessage::CrawlResult { status, .. } => assert_eq!(status, 200),
        other => panic!("expected CrawlResult, got: {other:?}"),
    }

    // ── Heartbeats flow, registration is not repeated ────────────────
    conn.next_matching(|m| *m == WsMessage::Heartbeat).await;
    conn.next_matching(|m| *m == WsMessage::Heartbeat).await;
    while let Ok(msg) = conn.recv.try_recv() {
        assert_ne!(msg.kind(), "register", "registration repeated on the same connection");
    }

    // ── Shutdown ─────────────────────────────────────────────────────
    shutdown.cancel();
    let result = tokio::time::timeout(WAIT, handle)
        .await
        .expect("agent did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn jobs_run_concurrently() {
    let site = start_site().await;
    let (addr, mut conn_rx) = start_orchestrator().await;

    let shutdown = CancellationToken::new();
    let handle = agent(addr, Duration::from_millis(100), Duration::from_secs(60))
        .spawn(shutdown.clone());
    let mut conn = next_conn(&mut conn_rx).await;

    conn.request_crawl("slow", &format!("http://{site}/slow")).await;
    conn.request_crawl("fast", &format!("http://{site}/ok")).await;

    let first = conn.next_matching(|m| m.job_id().is_some()).await;
    assert_eq!(first.job_id(), Some("fast"), "fast job waited behind slow job");
    let second = conn.next_matching(|m| m.job_id().is_some()).await;
    assert_eq!(second.job_id(), Some("slow"));

    shutdown.cancel();
    let _ = tokio::time::timeout(WAIT, handle).await;
}

#[tokio::test]
async fn reconnects_and_registers_again_after_orchestrator_hangs_up() {
    let (addr, mut conn_rx) = start_orchestrator().await;

    let agent = agent(addr, Duration::from_millis(100), Duration::from_secs(60));
    let mut status = agent.status();
    let shutdown = CancellationToken::new();
    let handle = agent.spawn(shutdown.clone());

    let first = next_conn(&mut conn_rx).await;
    assert_eq!(first.register.kind(), "register");
    tokio::time::timeout(WAIT, status.wait_for(|s| *s == LinkStatus::Connected))
        .await
        .unwrap()
        .unwrap();

    drop(first);
    tokio::time::timeout(WAIT, status.wait_for(|s| *s == LinkStatus::Disconnected))
        .await
        .expect("status never became disconnected")
        .unwrap();

    let second = next_conn(&mut conn_rx).await;
    match &second.register {
        WsMessage::Register { node_id, .. } => assert_eq!(node_id, "integration-node"),
        other => panic!("expected Register, got: {other:?}"),
    }

    // One close, one reconnect.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(conn_rx.try_recv().is_err(), "unexpected extra connection");

    shutdown.cancel();
    let _ = tokio::time::timeout(WAIT, handle).await;
}

#[tokio::test]
async fn keepalive_tick_recovers_when_orchestrator_starts_late() {
    // Reserve a port, leave it closed while the node starts.
    let addr = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap()
    };

    // Reconnect timer far in the future: only the keep-alive tick can
    // bring the node back.
    let shutdown = CancellationToken::new();
    let handle = agent(addr, Duration::from_secs(600), Duration::from_millis(200))
        .spawn(shutdown.clone());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let listener = TcpListener::bind(addr).await.unwrap();
    let mut conn_rx = serve_orchestrator(listener);

    let conn = next_conn(&mut conn_rx).await;
    assert_eq!(conn.register.kind(), "register");

    shutdown.cancel();
    let _ = tokio::time::timeout(WAIT, handle).await;
}

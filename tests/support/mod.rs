//! Scripted protocol peer for integration tests
//!
//! Binds a real TCP listener and plays the server side of the wire
//! protocol line by line, under test control: every inbound message the
//! client sends is read and decoded here, and tests push replies and
//! events back whenever the scenario calls for it.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

use winq::proto::{AppConnectResponse, Message, OpenWindowResponse};
use winq::{ClientConfig, WireRect};

/// Generous bound so a broken test fails instead of hanging the suite.
pub const STEP: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct MockServer {
    listener: TcpListener,
}

impl MockServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        Self { listener }
    }

    /// Client config pointing at this server.
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: self
                .listener
                .local_addr()
                .expect("mock server addr")
                .port(),
            ..ClientConfig::default()
        }
    }

    /// Accept the one client a test connects. Consumes the server.
    pub async fn accept(self) -> Peer {
        let (stream, _) = timeout(STEP, self.listener.accept())
            .await
            .expect("client never connected")
            .expect("accept");
        let (read_half, write_half) = stream.into_split();
        Peer {
            lines: BufReader::new(read_half).lines(),
            writer: write_half,
        }
    }
}

pub struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Peer {
    async fn recv_line(&mut self) -> String {
        timeout(STEP, self.lines.next_line())
            .await
            .expect("no message from client")
            .expect("read")
            .expect("client closed the stream")
    }

    pub async fn recv(&mut self) -> Message {
        let line = self.recv_line().await;
        serde_json::from_str(&line).expect("decode client message")
    }

    /// Raw JSON view for asserting on the wire shape itself.
    pub async fn recv_value(&mut self) -> serde_json::Value {
        let line = self.recv_line().await;
        serde_json::from_str(&line).expect("decode client message")
    }

    pub async fn send(&mut self, msg: &Message) {
        let mut line = serde_json::to_string(msg).expect("encode");
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.expect("write");
    }

    /// Push an arbitrary line, e.g. garbage for framing tests.
    pub async fn send_raw(&mut self, raw: &str) {
        let mut line = raw.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.expect("write");
    }

    /// Answer the AppConnect handshake with the given app id.
    pub async fn expect_hello(&mut self, app_id: &str) {
        match self.recv().await {
            Message::AppConnect(_) => {}
            other => panic!("expected AppConnect, got {other:?}"),
        }
        self.send(&Message::AppConnectResponse(AppConnectResponse {
            app_id: app_id.to_string(),
        }))
        .await;
    }

    /// Answer the next OpenWindowCommand, echoing its type and bounds.
    pub async fn answer_open_window(&mut self, app_id: &str, window_id: &str) -> WireRect {
        let cmd = match self.recv().await {
            Message::OpenWindowCommand(cmd) => cmd,
            other => panic!("expected OpenWindowCommand, got {other:?}"),
        };
        self.send(&Message::OpenWindowResponse(OpenWindowResponse {
            app_id: app_id.to_string(),
            window_id: window_id.to_string(),
            window_type: cmd.window_type.clone(),
            bounds: cmd.bounds,
        }))
        .await;
        cmd.bounds
    }
}

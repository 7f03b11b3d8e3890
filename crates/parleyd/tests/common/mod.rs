//! Shared helpers for the relay integration tests.
//!
//! Tests CAN use `.unwrap()` and `.expect()`; the panic-free policy covers
//! production code only.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use parleyd::config::SessionLimits;
use parleyd::server::{RelayContext, RelayServer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

/// Maximum time to wait for an expected line
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a client must stay quiet to count as silent
pub const SILENCE_WINDOW: Duration = Duration::from_millis(150);

const ASSIGNED_PREFIX: &str = "Assigned ID: ";

// ============================================================================
// Test Server
// ============================================================================

/// Relay running on an ephemeral localhost port.
pub struct TestServer {
    addr: SocketAddr,
    context: RelayContext,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Spawns a relay with room for 16 members and default limits.
    pub async fn spawn() -> Self {
        Self::spawn_with(16, SessionLimits::default()).await
    }

    pub async fn spawn_with(max_members: usize, limits: SessionLimits) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let context = RelayContext::spawn(max_members, limits);
        let cancel_token = CancellationToken::new();
        let server = RelayServer::new(addr.to_string(), context.clone(), cancel_token.clone());

        let task = tokio::spawn(async move {
            server.serve(listener).await;
        });

        Self {
            addr,
            context,
            cancel_token,
            task,
        }
    }

    pub fn context(&self) -> &RelayContext {
        &self.context
    }

    /// Opens a raw connection without reading anything.
    pub async fn connect(&self) -> TestClient {
        let stream = TcpStream::connect(self.addr).await.expect("connect");
        TestClient::new(stream)
    }

    /// Connects and consumes the two join lines.
    ///
    /// Returns the client (with its ID filled in) and its status line.
    pub async fn join(&self) -> (TestClient, String) {
        let mut client = self.connect().await;
        let assigned = client.recv().await;
        client.id = assigned
            .strip_prefix(ASSIGNED_PREFIX)
            .unwrap_or_else(|| panic!("expected assigned id, got {assigned:?}"))
            .to_string();
        let status = client.recv().await;
        (client, status)
    }

    /// Cancels the server and waits for its cleanup to finish.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        timeout(RECV_TIMEOUT, self.task)
            .await
            .expect("server stopped in time")
            .expect("server task");
    }
}

// ============================================================================
// Test Client
// ============================================================================

/// One chat connection with line helpers.
pub struct TestClient {
    pub id: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            id: String::new(),
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Sends one line.
    pub async fn send(&mut self, line: &str) {
        self.send_raw(format!("{line}\n").as_bytes()).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Reads one line, without its newline. Panics on EOF or timeout.
    pub async fn recv(&mut self) -> String {
        self.try_recv()
            .await
            .expect("connection closed while waiting for a line")
    }

    /// Reads one line, `None` on EOF. Panics on timeout.
    pub async fn try_recv(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap_or(0);
        if read == 0 {
            return None;
        }
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Reads one line and checks it.
    pub async fn expect(&mut self, expected: &str) {
        assert_eq!(self.recv().await, expected, "client {}", self.id);
    }

    /// Asserts the relay closes the connection with no further lines.
    pub async fn expect_closed(&mut self) {
        if let Some(line) = self.try_recv().await {
            panic!("client {} expected EOF, got {line:?}", self.id);
        }
    }

    /// Collects whatever arrives until the relay closes the connection.
    pub async fn recv_until_closed(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.try_recv().await {
            lines.push(line);
        }
        lines
    }

    /// Asserts nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        let mut line = String::new();
        let result = timeout(SILENCE_WINDOW, self.reader.read_line(&mut line)).await;
        assert!(
            result.is_err(),
            "client {} expected silence, got {line:?}",
            self.id
        );
    }
}

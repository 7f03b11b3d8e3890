//! TCP server for the parley relay.
//!
//! The server:
//! - Listens on a TCP socket for client connections
//! - Spawns a `Session` for each client
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   RelayServer   │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────────┐
//! │     Session     │────▶│   RegistryHandle    │
//! │  (per client)   │     │ CoordinatorRegister │
//! └───────┬─────────┘     └─────────────────────┘
//!         │ lines
//!         ▼
//! ┌─────────────────┐
//! │   Dispatcher    │
//! └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the crate's panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Accept errors are logged and the server keeps accepting

mod dispatch;
mod lines;
mod session;

pub use dispatch::{Dispatcher, Flow};
pub use session::{Session, SessionError, SessionState};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use parley_core::IdAllocator;

use crate::config::{RelayConfig, SessionLimits};
use crate::registry::{spawn_registry, CoordinatorRegister, RegistryHandle, RemovalReason};

// ============================================================================
// Shared Relay State
// ============================================================================

/// Everything sessions share: registry, coordinator register, ID
/// allocator and limits.
///
/// Cheap to clone; clones refer to the same state.
#[derive(Debug, Clone)]
pub struct RelayContext {
    registry: RegistryHandle,
    coordinator: CoordinatorRegister,
    ids: Arc<IdAllocator>,
    limits: SessionLimits,
}

impl RelayContext {
    /// Builds a context around an existing registry.
    pub fn new(registry: RegistryHandle, limits: SessionLimits) -> Self {
        Self {
            registry,
            coordinator: CoordinatorRegister::new(),
            ids: Arc::new(IdAllocator::new()),
            limits,
        }
    }

    /// Spawns a registry actor and builds a context around it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(max_members: usize, limits: SessionLimits) -> Self {
        Self::new(spawn_registry(max_members), limits)
    }

    /// Spawns a context configured by `config`.
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::spawn(config.max_members, config.session_limits())
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    pub fn coordinator(&self) -> &CoordinatorRegister {
        &self.coordinator
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }
}

// ============================================================================
// Server
// ============================================================================

/// TCP server for the relay.
pub struct RelayServer {
    /// Address to bind in `run`
    listen_addr: String,

    /// State shared with every session
    context: RelayContext,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Accepted connection counter, for logs
    connection_counter: AtomicU64,
}

impl RelayServer {
    /// Creates a new relay server.
    ///
    /// # Arguments
    ///
    /// * `listen_addr` - Address `run` binds, e.g. `127.0.0.1:7878`
    /// * `context` - Shared relay state
    /// * `cancel_token` - Token for graceful shutdown
    pub fn new(
        listen_addr: impl Into<String>,
        context: RelayContext,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            context,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        }
    }

    /// Creates a server from configuration, spawning a fresh registry.
    pub fn from_config(config: &RelayConfig, cancel_token: CancellationToken) -> Self {
        Self::new(
            config.listen_addr.clone(),
            RelayContext::from_config(config),
            cancel_token,
        )
    }

    /// Returns the configured listen address.
    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Returns the shared relay state.
    pub fn context(&self) -> &RelayContext {
        &self.context
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: self.listen_addr.clone(),
                error: e.to_string(),
            })
    }

    /// Binds and serves until the cancellation token is triggered.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener).await;
        Ok(())
    }

    /// Serves connections from an already-bound listener.
    ///
    /// Does not return until shutdown.
    pub async fn serve(&self, listener: TcpListener) {
        match listener.local_addr() {
            Ok(addr) => info!(addr = %addr, "Relay server listening"),
            Err(e) => warn!(error = %e, "Relay server listening on unknown address"),
        }

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let conn_num = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            self.handle_connection(stream, peer, conn_num);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }
            }
        }

        self.cleanup().await;
    }

    /// Handles a new client connection by spawning a session task.
    fn handle_connection(&self, stream: TcpStream, peer: SocketAddr, connection_number: u64) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        let session = Session::new(reader, writer, self.context.clone());

        tokio::spawn(async move {
            debug!(peer = %peer, connection = connection_number, "Client connected");
            let member_id = session.run().await;
            debug!(peer = %peer, member_id = ?member_id, "Client disconnected");
        });
    }

    /// Ends every member's session on shutdown.
    async fn cleanup(&self) {
        let members = self.context.registry().snapshot().await;
        let count = members.len();

        for member in members {
            member.terminate();
            self.context
                .registry()
                .remove(member.id(), RemovalReason::Shutdown)
                .await;
        }

        info!(members = count, "Server cleanup complete");
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },
}

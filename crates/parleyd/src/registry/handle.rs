//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending
//! commands to the registry actor from any session task.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the crate's panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `RegistryError::ChannelClosed` or an
//!   empty/absent result

use tokio::sync::{mpsc, oneshot};

use parley_core::MemberId;

use super::commands::{RegistryCommand, RegistryError, RemovalReason};
use super::member::MemberHandle;

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with the registry actor.
///
/// # Usage
///
/// ```ignore
/// let registry = spawn_registry(DEFAULT_MAX_MEMBERS);
///
/// registry.register(member.clone()).await?;
/// let everyone = registry.snapshot().await;
/// registry.remove(member.id(), RemovalReason::Departed).await;
/// ```
#[derive(Clone, Debug)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    ///
    /// # Arguments
    ///
    /// * `sender` - The command channel sender for communicating with the actor
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Register a newly joined member.
    ///
    /// # Errors
    ///
    /// - `RegistryError::DuplicateIdentity` if the ID is already registered
    /// - `RegistryError::RegistryFull` if the registry is at maximum capacity
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn register(&self, member: MemberHandle) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Register {
                member,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Resolve a member by ID.
    ///
    /// Returns `None` if the member isn't registered or if communication
    /// with the actor fails.
    pub async fn lookup(&self, member_id: &MemberId) -> Option<MemberHandle> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Lookup {
                member_id: member_id.clone(),
                respond_to: tx,
            })
            .await
            .ok()?;

        rx.await.ok()?
    }

    /// Remove a member from the registry.
    ///
    /// Idempotent: returns `true` only for the call that actually removed
    /// the member, `false` if it was already gone or the actor is down.
    pub async fn remove(&self, member_id: &MemberId, reason: RemovalReason) -> bool {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::Remove {
                member_id: member_id.clone(),
                reason,
                respond_to: tx,
            })
            .await
            .is_err()
        {
            return false;
        }

        rx.await.unwrap_or(false)
    }

    /// Point-in-time copy of every registered member, ordered by ID.
    ///
    /// Returns an empty vector if communication with the actor fails.
    pub async fn snapshot(&self) -> Vec<MemberHandle> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::Snapshot { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// IDs of every registered member, ordered.
    pub async fn member_ids(&self) -> Vec<MemberId> {
        self.snapshot()
            .await
            .into_iter()
            .map(|m| m.id().clone())
            .collect()
    }

    /// Check if the actor is still running.
    ///
    /// Returns `true` if the command channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

//! Registry actor commands and errors.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations
//! - `RemovalReason`: Why a member left the registry (for logging)

use parley_core::MemberId;
use thiserror::Error;
use tokio::sync::oneshot;

use super::member::MemberHandle;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command carries a oneshot channel for the response, so callers
/// get request-response semantics without sharing the map itself.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Insert a newly joined member.
    ///
    /// # Errors
    /// - `RegistryError::DuplicateIdentity` if the ID is already present
    /// - `RegistryError::RegistryFull` if at maximum capacity
    Register {
        /// Handle of the joining member
        member: MemberHandle,
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Resolve an ID to a member handle.
    Lookup {
        /// ID to resolve
        member_id: MemberId,
        /// Channel to send the result
        respond_to: oneshot::Sender<Option<MemberHandle>>,
    },

    /// Remove a member. Removing an absent ID is a no-op.
    Remove {
        /// ID of the member to remove
        member_id: MemberId,
        /// Why the member is leaving
        reason: RemovalReason,
        /// Receives `true` if the member was present
        respond_to: oneshot::Sender<bool>,
    },

    /// Point-in-time copy of every registered member, ordered by ID.
    Snapshot {
        /// Channel to send the results
        respond_to: oneshot::Sender<Vec<MemberHandle>>,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The ID is already registered. The allocator never reissues IDs,
    /// so this means an invariant was broken somewhere.
    #[error("member already registered: {0}")]
    DuplicateIdentity(MemberId),

    /// The registry has reached its maximum member capacity.
    #[error("registry is full (max: {max} members)")]
    RegistryFull {
        /// Maximum number of members allowed
        max: usize,
    },

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

/// Reason a member was removed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The member's own session ended (quit, EOF or transport error).
    Departed,

    /// The coordinator kicked the member.
    Kicked,

    /// The relay is shutting down.
    Shutdown,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Departed => write!(f, "session ended"),
            Self::Kicked => write!(f, "kicked by coordinator"),
            Self::Shutdown => write!(f, "relay shutting down"),
        }
    }
}

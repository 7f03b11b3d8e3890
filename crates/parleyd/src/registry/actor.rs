//! Registry actor - owns the member map and processes commands.
//!
//! The RegistryActor is the single owner of the member map. It receives
//! commands via an mpsc channel and answers each through a oneshot.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the crate's panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Response send failures are ignored (the caller went away)

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use parley_core::MemberId;

use super::commands::{RegistryCommand, RegistryError, RemovalReason};
use super::member::MemberHandle;

// ============================================================================
// Resource Limits
// ============================================================================

/// Default maximum number of members the registry holds.
pub const DEFAULT_MAX_MEMBERS: usize = 1024;

// ============================================================================
// Registry Actor
// ============================================================================

/// The registry actor - owns all member handles.
///
/// Commands are processed one at a time in a single task, so every
/// operation is atomic with respect to every other. No operation awaits
/// while holding the map, which keeps each critical section O(1) apart
/// from snapshots.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Registered members keyed by identity
    members: HashMap<MemberId, MemberHandle>,

    /// Capacity limit
    max_members: usize,
}

impl RegistryActor {
    /// Creates a new registry actor.
    ///
    /// # Arguments
    ///
    /// * `receiver` - Channel for receiving commands
    /// * `max_members` - Registration fails with `RegistryFull` beyond this
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>, max_members: usize) -> Self {
        Self {
            receiver,
            members: HashMap::new(),
            max_members,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until every handle has been dropped.
    pub async fn run(mut self) {
        info!(max_members = self.max_members, "Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(members = self.members.len(), "Registry actor stopped");
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Register { member, respond_to } => {
                let result = self.handle_register(member);
                // Ignore send error - caller may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::Lookup {
                member_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.members.get(&member_id).cloned());
            }
            RegistryCommand::Remove {
                member_id,
                reason,
                respond_to,
            } => {
                let result = self.handle_remove(&member_id, reason);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.handle_snapshot());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_register(&mut self, member: MemberHandle) -> Result<(), RegistryError> {
        if self.members.contains_key(member.id()) {
            warn!(member_id = %member.id(), "Member already registered, rejecting");
            return Err(RegistryError::DuplicateIdentity(member.id().clone()));
        }

        if self.members.len() >= self.max_members {
            warn!(
                member_id = %member.id(),
                current = self.members.len(),
                max = self.max_members,
                "Registry is full, rejecting registration"
            );
            return Err(RegistryError::RegistryFull {
                max: self.max_members,
            });
        }

        let member_id = member.id().clone();
        self.members.insert(member_id.clone(), member);

        info!(
            member_id = %member_id,
            total_members = self.members.len(),
            "Member registered"
        );

        Ok(())
    }

    fn handle_remove(&mut self, member_id: &MemberId, reason: RemovalReason) -> bool {
        match self.members.remove(member_id) {
            Some(_) => {
                info!(
                    member_id = %member_id,
                    reason = %reason,
                    total_members = self.members.len(),
                    "Member removed"
                );
                true
            }
            None => {
                debug!(member_id = %member_id, reason = %reason, "Member already removed");
                false
            }
        }
    }

    /// Copies out every handle, ordered by ID.
    fn handle_snapshot(&self) -> Vec<MemberHandle> {
        let mut members: Vec<MemberHandle> = self.members.values().cloned().collect();
        members.sort_by(|a, b| a.id().cmp(b.id()));
        members
    }
}

//! The coordinator register.
//!
//! Holds which member (if any) currently coordinates the group. All
//! mutation goes through compare-and-set style operations on a
//! `tokio::sync::watch` channel, so concurrent joins can race on
//! [`CoordinatorRegister::elect_if_absent`] and exactly one wins.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use parley_core::MemberId;

/// Shared register naming the current coordinator.
///
/// Cheap to clone; every clone refers to the same register.
#[derive(Debug, Clone)]
pub struct CoordinatorRegister {
    state: Arc<watch::Sender<Option<MemberId>>>,
}

impl CoordinatorRegister {
    /// Creates an empty register.
    pub fn new() -> Self {
        // Sends never require a live receiver, so the initial one can go.
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Makes `id` coordinator only if nobody is.
    ///
    /// Returns whether the election took effect.
    pub fn elect_if_absent(&self, id: &MemberId) -> bool {
        let elected = self.state.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(id.clone());
            true
        });

        if elected {
            info!(member_id = %id, "Coordinator elected");
        }
        elected
    }

    /// Returns the current coordinator.
    pub fn current(&self) -> Option<MemberId> {
        self.state.borrow().clone()
    }

    /// Unconditionally makes `id` coordinator.
    pub fn reassign(&self, id: MemberId) {
        info!(member_id = %id, "Coordinator reassigned");
        self.state.send_replace(Some(id));
    }

    /// Moves the role from `expected` to `next`, but only while `expected`
    /// holds it.
    ///
    /// Returns whether the move took effect. Concurrent hand-offs from the
    /// same holder race here and exactly one wins.
    pub fn reassign_if(&self, expected: &MemberId, next: MemberId) -> bool {
        let moved = self.state.send_if_modified(|current| {
            if current.as_ref() != Some(expected) {
                return false;
            }
            *current = Some(next.clone());
            true
        });

        if moved {
            info!(from = %expected, member_id = %next, "Coordinator reassigned");
        }
        moved
    }

    /// Clears the register, but only while `id` holds it.
    ///
    /// Returns whether the register was cleared.
    pub fn vacate(&self, id: &MemberId) -> bool {
        let vacated = self.state.send_if_modified(|current| {
            if current.as_ref() != Some(id) {
                return false;
            }
            *current = None;
            true
        });

        if vacated {
            info!(member_id = %id, "Coordinator vacated");
        }
        vacated
    }

    /// Returns true if `id` is the current coordinator.
    pub fn is_coordinator(&self, id: &MemberId) -> bool {
        self.state.borrow().as_ref() == Some(id)
    }

    /// Watches coordinator changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<MemberId>> {
        self.state.subscribe()
    }
}

impl Default for CoordinatorRegister {
    fn default() -> Self {
        Self::new()
    }
}

//! Handle to one connected member, as stored in the registry.
//!
//! A `MemberHandle` is the only way other sessions reach a member: it
//! queues outbound lines for the member's writer task and can force the
//! member's session to terminate. It never touches the socket directly.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use parley_core::MemberId;
use parley_protocol::Notice;

/// Cheap-to-clone handle for a registered member.
#[derive(Debug, Clone)]
pub struct MemberHandle {
    /// Identity assigned at join
    id: MemberId,

    /// Queue drained by the member's writer task
    outbound: mpsc::Sender<String>,

    /// Cancelled when the member's session must end
    terminate: CancellationToken,
}

impl MemberHandle {
    /// Creates a handle.
    ///
    /// # Arguments
    ///
    /// * `id` - Identity of the member
    /// * `outbound` - Sender side of the member's outbound line queue
    /// * `terminate` - Token the member's read loop watches
    pub fn new(id: MemberId, outbound: mpsc::Sender<String>, terminate: CancellationToken) -> Self {
        Self {
            id,
            outbound,
            terminate,
        }
    }

    /// Returns the member's identity.
    pub fn id(&self) -> &MemberId {
        &self.id
    }

    /// Queues a notice for delivery.
    ///
    /// See [`MemberHandle::send_line`].
    pub fn send(&self, notice: &Notice) -> bool {
        self.send_line(notice.to_string())
    }

    /// Queues a line for delivery without waiting.
    ///
    /// Returns `false` if the line was dropped: the queue is full because
    /// the peer is not keeping up, or the writer has already stopped.
    /// Nothing is retried.
    pub fn send_line(&self, line: String) -> bool {
        match self.outbound.try_send(line) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(member_id = %self.id, "Outbound queue full, dropping line");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(member_id = %self.id, "Outbound queue closed, dropping line");
                false
            }
        }
    }

    /// Forces the member's session into termination.
    ///
    /// Idempotent. The session's own cleanup still runs exactly once.
    pub fn terminate(&self) {
        self.terminate.cancel();
    }
}

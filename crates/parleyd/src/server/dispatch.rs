//! Command dispatcher.
//!
//! Turns one line from a member into actions on the shared registry and
//! coordinator register. Every action is a sequence of independent atomic
//! steps (lookup, send, remove, broadcast); a concurrent observer can see
//! a kick half done.

use tracing::{debug, info};

use parley_core::MemberId;
use parley_protocol::{Command, Notice};

use crate::registry::{CoordinatorRegister, MemberHandle, RegistryHandle, RemovalReason};

/// What the session should do after a line was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading.
    Continue,

    /// The member asked to leave.
    Quit,
}

/// Executes member commands against shared state.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: RegistryHandle,
    coordinator: CoordinatorRegister,
}

impl Dispatcher {
    pub fn new(registry: RegistryHandle, coordinator: CoordinatorRegister) -> Self {
        Self {
            registry,
            coordinator,
        }
    }

    /// Handles one trimmed, non-empty input line from `issuer`.
    pub async fn dispatch(&self, issuer: &MemberHandle, line: &str) -> Flow {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                debug!(member_id = %issuer.id(), error = %e, "Ignoring malformed command");
                return Flow::Continue;
            }
        };

        debug!(member_id = %issuer.id(), command = ?command, "Dispatching command");

        match command {
            Command::Quit => {
                info!(member_id = %issuer.id(), "Member requested quit");
                return Flow::Quit;
            }
            Command::Kick { target } => self.kick(issuer, target).await,
            Command::Private { target, text } => self.private(issuer, target, text).await,
            Command::Details => self.details(issuer).await,
            Command::Chat { text } => {
                self.broadcast(&Notice::Chat {
                    from: issuer.id().clone(),
                    text,
                })
                .await;
            }
        }

        Flow::Continue
    }

    /// Sends a notice to every registered member, the sender included.
    ///
    /// Returns how many members accepted the line. A member whose queue is
    /// full or closed is skipped without affecting the others.
    pub async fn broadcast(&self, notice: &Notice) -> usize {
        let line = notice.to_string();
        let members = self.registry.snapshot().await;

        let delivered = members
            .iter()
            .filter(|member| member.send_line(line.clone()))
            .count();

        debug!(
            recipients = members.len(),
            delivered = delivered,
            "Broadcast sent"
        );
        delivered
    }

    async fn kick(&self, issuer: &MemberHandle, target: MemberId) {
        if !self.coordinator.is_coordinator(issuer.id()) {
            issuer.send(&Notice::KickNotAuthorized);
            return;
        }

        let Some(member) = self.registry.lookup(&target).await else {
            issuer.send(&Notice::NotFound(target.to_string()));
            return;
        };

        member.send(&Notice::KickedByCoordinator);
        member.terminate();
        self.registry.remove(&target, RemovalReason::Kicked).await;

        info!(coordinator = %issuer.id(), member_id = %target, "Member kicked");

        // Announced even if the target was already on its way out
        self.broadcast(&Notice::KickedOut(target)).await;
    }

    async fn private(&self, issuer: &MemberHandle, target: MemberId, text: String) {
        let Some(member) = self.registry.lookup(&target).await else {
            issuer.send(&Notice::NotFound(target.to_string()));
            return;
        };

        member.send(&Notice::PrivateFrom {
            from: issuer.id().clone(),
            text: text.clone(),
        });
        issuer.send(&Notice::PrivateTo { to: target, text });
    }

    async fn details(&self, issuer: &MemberHandle) {
        if !self.coordinator.is_coordinator(issuer.id()) {
            issuer.send(&Notice::DetailsNotAuthorized);
            return;
        }

        let ids = self.registry.member_ids().await;
        issuer.send(&Notice::Members(ids));
    }
}

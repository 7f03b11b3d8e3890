//! Lines sent from the relay to clients.

use std::fmt;

use parley_core::MemberId;

/// A server-to-client line.
///
/// `Display` renders the exact text put on the wire (without the trailing
/// newline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// First line after joining.
    AssignedId(MemberId),

    /// The joining member won the election.
    YouAreCoordinator,

    /// Someone else already coordinates.
    CurrentCoordinator(MemberId),

    /// The register was empty when the joiner looked.
    NoCoordinator,

    /// Succession picked the recipient.
    YouAreNewCoordinator,

    /// Succession announcement to the whole group.
    NewCoordinator(MemberId),

    /// Chat message from a member.
    Chat { from: MemberId, text: String },

    /// Delivered private message.
    PrivateFrom { from: MemberId, text: String },

    /// Echo of a private message back to its sender.
    PrivateTo { to: MemberId, text: String },

    /// A command referenced a member that isn't connected.
    ///
    /// Holds the target exactly as the client typed it.
    NotFound(String),

    /// Non-coordinator tried `/kick`.
    KickNotAuthorized,

    /// Non-coordinator tried `/details`.
    DetailsNotAuthorized,

    /// Sent to a member right before the coordinator disconnects it.
    KickedByCoordinator,

    /// Group announcement after a kick.
    KickedOut(MemberId),

    /// Reply to `/details`.
    Members(Vec<MemberId>),

    /// Group announcement after a member leaves.
    Left(MemberId),

    /// Join refused because the relay is at capacity.
    ServerFull,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssignedId(id) => write!(f, "Assigned ID: {id}"),
            Self::YouAreCoordinator => write!(f, "You are the coordinator."),
            Self::CurrentCoordinator(id) => write!(f, "Current coordinator is: {id}"),
            Self::NoCoordinator => write!(f, "No coordinator currently assigned."),
            Self::YouAreNewCoordinator => write!(f, "You are the new coordinator."),
            Self::NewCoordinator(id) => write!(f, "New coordinator is: {id}"),
            Self::Chat { from, text } => write!(f, "{from}: {text}"),
            Self::PrivateFrom { from, text } => write!(f, "Private message from {from}: {text}"),
            Self::PrivateTo { to, text } => write!(f, "Private message to {to}: {text}"),
            Self::NotFound(target) => write!(f, "{target} not found"),
            Self::KickNotAuthorized => write!(f, "You are not authorized to kick members."),
            Self::DetailsNotAuthorized => write!(f, "Only coordinator can provide details."),
            Self::KickedByCoordinator => write!(f, "You have been kicked by coordinator."),
            Self::KickedOut(id) => write!(f, "User {id} has been kicked out by the coordinator."),
            Self::Members(ids) => {
                let mut first = true;
                for id in ids {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{id}")?;
                }
                Ok(())
            }
            Self::Left(id) => write!(f, "User {id} has left the chat."),
            Self::ServerFull => write!(f, "Server is full."),
        }
    }
}

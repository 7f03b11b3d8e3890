//! Member registry using Actor pattern, plus the coordinator register.
//!
//! The registry is the shared table of connected members. It receives
//! commands via a tokio mpsc channel and is the single source of truth for
//! who is in the chat. The coordinator register lives beside it and records
//! which member holds coordinator privileges.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │  Session tasks  │────▶│  RegistryActor  │
//! └─────────────────┘     └─────────────────┘
//!         │                       │
//!         │   RegistryCommand     │
//!         │   (mpsc channel)      │
//!         ▼                       ▼
//!  register/lookup/       HashMap<MemberId,
//!  remove/snapshot         MemberHandle>
//!
//! ┌─────────────────────┐
//! │ CoordinatorRegister │  watch::Sender<Option<MemberId>>
//! └─────────────────────┘  elect_if_absent / reassign_if / vacate
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::mpsc;

mod actor;
mod commands;
mod coordinator;
mod handle;
mod member;

pub use actor::{RegistryActor, DEFAULT_MAX_MEMBERS};
pub use commands::{RegistryCommand, RegistryError, RemovalReason};
pub use coordinator::CoordinatorRegister;
pub use handle::RegistryHandle;
pub use member::MemberHandle;

/// Channel buffer size
const COMMAND_BUFFER: usize = 256;

/// Spawn the registry actor and return a handle for interaction.
///
/// The actor stops once every clone of the returned handle is dropped.
///
/// # Example
///
/// ```no_run
/// use parleyd::registry::{spawn_registry, DEFAULT_MAX_MEMBERS};
///
/// #[tokio::main]
/// async fn main() {
///     let registry = spawn_registry(DEFAULT_MAX_MEMBERS);
///     let members = registry.snapshot().await;
///     assert!(members.is_empty());
/// }
/// ```
pub fn spawn_registry(max_members: usize) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = RegistryActor::new(cmd_rx, max_members);
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx)
}

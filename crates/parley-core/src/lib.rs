//! Parley Core - Shared identity types for the chat relay
//!
//! This crate provides the member identity type shared between
//! the relay daemon (parleyd), the wire protocol and the client.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod member;

// Re-exports for convenience
pub use member::{IdAllocator, MemberId, MEMBER_ID_WIDTH};

//! Parley Protocol - Line protocol between chat clients and the relay
//!
//! Every message is a single line of UTF-8 text. This crate provides
//! parsing for client commands and rendering for server notices.

pub mod command;
pub mod notice;

pub use command::{Command, CommandError};
pub use notice::Notice;

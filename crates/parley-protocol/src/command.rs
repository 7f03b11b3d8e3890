//! Parsing client command lines.
//!
//! Keywords are matched case-insensitively on the first whitespace-delimited
//! token. Anything that isn't a recognized keyword is a chat message.

use parley_core::MemberId;
use thiserror::Error;

/// Keyword that closes the sender's own connection.
pub const QUIT: &str = "/quit";

/// Keyword for the coordinator-only disconnect command.
pub const KICK: &str = "/kick";

/// Keyword for a direct message to one member.
pub const PRIVATE: &str = "/private";

/// Keyword for the coordinator-only member listing.
pub const DETAILS: &str = "/details";

/// A command sent by a client, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the chat.
    Quit,

    /// Disconnect another member (coordinator only).
    Kick {
        /// Member to disconnect
        target: MemberId,
    },

    /// Send text to a single member.
    Private {
        /// Recipient
        target: MemberId,
        /// Message body
        text: String,
    },

    /// List all connected members (coordinator only).
    Details,

    /// Plain text for everyone.
    Chat {
        /// Message body
        text: String,
    },
}

/// A recognized command keyword without the arguments it needs.
///
/// Clients get no reply for these; the relay drops the line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{command} requires a member id")]
    MissingTarget { command: &'static str },

    #[error("{command} requires message text")]
    MissingText { command: &'static str },
}

impl Command {
    /// Parses one line of client input.
    ///
    /// The line should already be trimmed; surrounding whitespace would
    /// otherwise end up in chat text.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let (keyword, rest) = split_token(line);

        if keyword.eq_ignore_ascii_case(QUIT) {
            return Ok(Self::Quit);
        }

        if keyword.eq_ignore_ascii_case(DETAILS) {
            return Ok(Self::Details);
        }

        if keyword.eq_ignore_ascii_case(KICK) {
            // Everything after the keyword names the target
            let target = rest
                .filter(|r| !r.is_empty())
                .ok_or(CommandError::MissingTarget { command: KICK })?;
            return Ok(Self::Kick {
                target: MemberId::new(target),
            });
        }

        if keyword.eq_ignore_ascii_case(PRIVATE) {
            let rest = rest
                .filter(|r| !r.is_empty())
                .ok_or(CommandError::MissingTarget { command: PRIVATE })?;
            let (target, text) = split_token(rest);
            let text = text
                .filter(|t| !t.is_empty())
                .ok_or(CommandError::MissingText { command: PRIVATE })?;
            return Ok(Self::Private {
                target: MemberId::new(target),
                text: text.to_string(),
            });
        }

        Ok(Self::Chat {
            text: line.to_string(),
        })
    }
}

/// Splits off the first token at the first run of whitespace.
fn split_token(s: &str) -> (&str, Option<&str>) {
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, Some(tail.trim_start())),
        None => (s, None),
    }
}

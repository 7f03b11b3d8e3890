//! Session lifecycle for individual client connections.
//!
//! Each client connection gets its own `Session` that:
//! - Allocates an identity, registers, and runs the coordinator election
//! - Reads lines and hands them to the `Dispatcher`
//! - On exit, deregisters, hands off coordination if needed, and
//!   announces the departure
//!
//! Outbound lines never go straight to the socket. They are queued on a
//! bounded channel drained by a separate writer task, so a slow client only
//! ever stalls its own writer. A writer that gives up ends its session.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the crate's panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Transport errors end the session the same way EOF does

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use parley_core::MemberId;
use parley_protocol::Notice;

use super::dispatch::{Dispatcher, Flow};
use super::lines::{Inbound, LineReader};
use super::RelayContext;
use crate::config::SessionLimits;
use crate::registry::{MemberHandle, RegistryError, RemovalReason};

/// Lifecycle state of a session, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport accepted, no identity yet.
    Joining,
    /// Registered and reading commands.
    Active,
    /// Cleaning up.
    Terminating,
    /// Cleanup finished.
    Closed,
}

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCause {
    Quit,
    Eof,
    TransportError,
    IdleTimeout,
    Terminated,
}

/// One connected client.
pub struct Session<R, W> {
    /// Length-capped reader for incoming lines
    reader: LineReader<R>,

    /// Write half, moved into the writer task on start
    writer: W,

    /// Shared relay state
    context: RelayContext,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Creates a session over a byte stream's read and write halves.
    pub fn new(reader: R, writer: W, context: RelayContext) -> Self {
        let max_line_length = context.limits().max_line_length;
        Self {
            reader: LineReader::new(reader, max_line_length),
            writer,
            context,
        }
    }

    /// Runs the session to completion.
    ///
    /// Returns the member's identity if it got registered, `None` if the
    /// join was refused. Cleanup runs exactly once, here, whatever ended
    /// the session.
    pub async fn run(self) -> Option<MemberId> {
        let Session {
            mut reader,
            writer,
            context,
        } = self;
        let limits = context.limits().clone();

        let terminate = CancellationToken::new();
        let (outbound_tx, outbound_rx) = mpsc::channel(limits.outbound_buffer);
        tokio::spawn(write_lines(
            writer,
            outbound_rx,
            limits.write_timeout,
            terminate.clone(),
        ));

        let member_id = context.ids().next_id();
        let member = MemberHandle::new(member_id.clone(), outbound_tx, terminate.clone());
        debug!(member_id = %member_id, state = ?SessionState::Joining, "Session joining");

        // Queued before registering so nothing broadcast to us can overtake it
        member.send(&Notice::AssignedId(member_id.clone()));

        if let Err(e) = context.registry().register(member.clone()).await {
            match e {
                RegistryError::RegistryFull { max } => {
                    warn!(member_id = %member_id, max = max, "Join refused, relay full");
                    member.send(&Notice::ServerFull);
                }
                RegistryError::DuplicateIdentity(_) => {
                    error!(member_id = %member_id, "Identity issued twice, closing connection");
                }
                RegistryError::ChannelClosed => {
                    warn!(member_id = %member_id, "Registry unavailable, closing connection");
                }
            }
            return None;
        }

        let elected = context.coordinator().elect_if_absent(&member_id);
        announce_status(&context, &member, elected);
        info!(member_id = %member_id, coordinator = elected, state = ?SessionState::Active, "Member joined");

        let dispatcher = Dispatcher::new(context.registry().clone(), context.coordinator().clone());
        let cause = read_loop(&mut reader, &member, &dispatcher, &terminate, &limits).await;

        debug!(member_id = %member_id, cause = ?cause, state = ?SessionState::Terminating, "Session ending");
        terminate.cancel();
        depart(&context, &dispatcher, &member).await;

        info!(member_id = %member_id, cause = ?cause, state = ?SessionState::Closed, "Member left");
        Some(member_id)
    }
}

/// Reads and dispatches lines until something ends the session.
async fn read_loop<R>(
    reader: &mut LineReader<R>,
    member: &MemberHandle,
    dispatcher: &Dispatcher,
    terminate: &CancellationToken,
    limits: &SessionLimits,
) -> ExitCause
where
    R: AsyncRead + Unpin,
{
    loop {
        let read = tokio::select! {
            _ = terminate.cancelled() => return ExitCause::Terminated,
            result = next_line(reader, limits.idle_timeout) => result,
        };

        let line = match read {
            Ok(Inbound::Line(line)) => line,
            Ok(Inbound::Oversized) => {
                warn!(
                    member_id = %member.id(),
                    max = limits.max_line_length,
                    "Discarding oversized line"
                );
                continue;
            }
            Ok(Inbound::Eof) => return ExitCause::Eof,
            Err(SessionError::IdleTimeout) => return ExitCause::IdleTimeout,
            Err(e) => {
                debug!(member_id = %member.id(), error = %e, "Transport failed");
                return ExitCause::TransportError;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if dispatcher.dispatch(member, input).await == Flow::Quit {
            return ExitCause::Quit;
        }
    }
}

/// Reads one line, bounded by the idle timeout if there is one.
async fn next_line<R>(
    reader: &mut LineReader<R>,
    idle_timeout: Option<Duration>,
) -> Result<Inbound, SessionError>
where
    R: AsyncRead + Unpin,
{
    match idle_timeout {
        Some(limit) => timeout(limit, reader.next_line())
            .await
            .map_err(|_| SessionError::IdleTimeout)?,
        None => reader.next_line().await,
    }
}

/// Sends the join status: assigned coordinator role or who holds it.
fn announce_status(context: &RelayContext, member: &MemberHandle, elected: bool) {
    let status = if elected {
        Notice::YouAreCoordinator
    } else {
        match context.coordinator().current() {
            Some(id) => Notice::CurrentCoordinator(id),
            // Another member's departure vacated the register after our
            // election attempt; transient
            None => Notice::NoCoordinator,
        }
    };
    member.send(&status);
}

/// Deregisters the member, hands off coordination, announces departure.
async fn depart(context: &RelayContext, dispatcher: &Dispatcher, member: &MemberHandle) {
    context
        .registry()
        .remove(member.id(), RemovalReason::Departed)
        .await;

    if context.coordinator().is_coordinator(member.id()) {
        hand_off(context, dispatcher, member.id()).await;
    }

    dispatcher.broadcast(&Notice::Left(member.id().clone())).await;
}

/// Picks a new coordinator after `outgoing` left.
///
/// The lowest remaining ID (the longest-connected member) takes over. If
/// the chosen member leaves before we can confirm it, the next one is
/// tried. With nobody left the register is cleared, then re-checked once
/// for a member that joined while we were looking.
///
/// Every step moves the role off the previous holder with a
/// compare-and-set, so when a departing candidate starts its own hand-off
/// only one of the two carries on.
async fn hand_off(context: &RelayContext, dispatcher: &Dispatcher, outgoing: &MemberId) {
    let registry = context.registry();
    let coordinator = context.coordinator();
    let mut holder = outgoing.clone();

    while let Some(next) = registry.snapshot().await.into_iter().next() {
        if !coordinator.reassign_if(&holder, next.id().clone()) {
            debug!(member_id = %holder, "Hand-off continued by another session");
            return;
        }
        holder = next.id().clone();

        if registry.lookup(next.id()).await.is_some() {
            announce_successor(dispatcher, &next).await;
            return;
        }

        debug!(member_id = %next.id(), "Successor left before hand-off, retrying");
    }

    if !coordinator.vacate(&holder) {
        return;
    }

    info!(member_id = %outgoing, "Last member left, no coordinator");

    if let Some(late) = registry.snapshot().await.into_iter().next() {
        if coordinator.elect_if_absent(late.id()) {
            announce_successor(dispatcher, &late).await;
        }
    }
}

async fn announce_successor(dispatcher: &Dispatcher, next: &MemberHandle) {
    next.send(&Notice::YouAreNewCoordinator);
    dispatcher
        .broadcast(&Notice::NewCoordinator(next.id().clone()))
        .await;
}

/// Drains a member's outbound queue onto the transport.
///
/// Stops when every queue sender is gone, or on the first failed or
/// timed-out write. The write half is shut down on exit, which closes the
/// client's side of the stream, and `terminate` is cancelled so a member
/// that can no longer be written to leaves the chat.
async fn write_lines<W>(
    writer: W,
    mut outbound: mpsc::Receiver<String>,
    write_timeout: Duration,
    terminate: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::new(writer);

    while let Some(line) = outbound.recv().await {
        if let Err(e) = write_line(&mut writer, &line, write_timeout).await {
            debug!(error = %e, "Writer stopping");
            break;
        }
    }

    // Refuse further lines before the socket goes away
    outbound.close();
    terminate.cancel();
    let _ = writer.shutdown().await;
}

async fn write_line<W>(
    writer: &mut BufWriter<W>,
    line: &str,
    write_timeout: Duration,
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    match timeout(write_timeout, async {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    })
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SessionError::Io(e.to_string())),
        Err(_) => Err(SessionError::WriteTimeout),
    }
}

/// Errors that can occur on a session's transport.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Idle timeout")]
    IdleTimeout,

    #[error("Write timeout")]
    WriteTimeout,
}

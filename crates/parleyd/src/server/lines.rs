//! Inbound line framing.
//!
//! Splits a client's byte stream into lines with `AnyDelimiterCodec`, so
//! no more than `max_line_length` bytes of a single line are ever held.
//! An oversized line is reported once and the rest of it, up to the next
//! newline, is skipped. Bytes that aren't valid UTF-8 are replaced rather
//! than ending the session.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};

use super::SessionError;

/// Bytes requested from the transport per read.
const READ_CHUNK: usize = 4096;

/// One framing result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inbound {
    /// A complete line without its newline, lossily decoded.
    Line(String),

    /// A line exceeded the limit; its remainder is being skipped.
    Oversized,

    /// The client closed its side of the stream.
    Eof,
}

/// Length-capped line reader over a byte stream.
pub(crate) struct LineReader<R> {
    reader: R,
    codec: AnyDelimiterCodec,
    buffer: BytesMut,
    eof: bool,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    pub(crate) fn new(reader: R, max_line_length: usize) -> Self {
        Self {
            reader,
            codec: AnyDelimiterCodec::new_with_max_length(vec![b'\n'], Vec::new(), max_line_length),
            buffer: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
        }
    }

    /// Returns the next line, an oversize report, or end of stream.
    ///
    /// Cancel safe: bytes already read stay buffered for the next call.
    pub(crate) async fn next_line(&mut self) -> Result<Inbound, SessionError> {
        loop {
            let decoded = if self.eof {
                self.codec.decode_eof(&mut self.buffer)
            } else {
                self.codec.decode(&mut self.buffer)
            };

            match decoded {
                Ok(Some(chunk)) => {
                    return Ok(Inbound::Line(String::from_utf8_lossy(&chunk).into_owned()));
                }
                Ok(None) if self.eof => return Ok(Inbound::Eof),
                Ok(None) => {}
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                    return Ok(Inbound::Oversized);
                }
                Err(AnyDelimiterCodecError::Io(e)) => return Err(SessionError::Io(e.to_string())),
            }

            self.buffer.reserve(READ_CHUNK);
            let read = self
                .reader
                .read_buf(&mut self.buffer)
                .await
                .map_err(|e| SessionError::Io(e.to_string()))?;
            if read == 0 {
                self.eof = true;
            }
        }
    }

    /// Bytes buffered but not yet returned as a line.
    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

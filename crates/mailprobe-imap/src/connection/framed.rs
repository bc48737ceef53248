//! Splits the byte stream into IMAP response frames.
//!
//! A frame is one CRLF-terminated line, extended by any `{n}` literals it
//! announces. A probe only ever sees greetings and short status responses,
//! so the size caps are far tighter than a mail-fetching client would use.

#![allow(clippy::missing_errors_doc)]

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const READ_BUFFER: usize = 4096;

/// Longest accepted line, CRLF included.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Largest accepted literal.
const MAX_LITERAL_SIZE: usize = 1024 * 1024;

/// Buffered reader and writer speaking IMAP framing.
pub struct FramedStream<S> {
    reader: BufReader<S>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER, stream),
        }
    }

    /// Reads one frame: a line plus the literals it announces.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        let mut frame = Vec::new();

        loop {
            let line_start = frame.len();
            self.read_line_into(&mut frame).await?;

            let Some(size) = literal_size(&frame[line_start..]) else {
                return Ok(frame);
            };
            if size > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {size} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            let literal_start = frame.len();
            frame.resize(literal_start + size, 0);
            self.reader.read_exact(&mut frame[literal_start..]).await?;
        }
    }

    /// Appends bytes up to and including the next CRLF.
    ///
    /// A bare LF does not end the line.
    async fn read_line_into(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        let start = buf.len();

        loop {
            let budget = (start + MAX_LINE_LENGTH).saturating_sub(buf.len());
            if budget == 0 {
                return Err(Error::Protocol("line too long".to_string()));
            }

            let read = (&mut self.reader)
                .take(budget as u64)
                .read_until(b'\n', buf)
                .await?;
            if read == 0 {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-response",
                )));
            }
            if buf[start..].ends_with(b"\r\n") {
                return Ok(());
            }
        }
    }

    /// Reads frames until the completion tagged `tag`, which comes last.
    ///
    /// An untagged BYE ends the exchange early with [`Error::Bye`], since the
    /// completion will never arrive.
    pub async fn read_exchange(&mut self, tag: &str) -> Result<Vec<Vec<u8>>> {
        let mut frames = Vec::new();

        loop {
            let frame = self.read_frame().await?;

            if is_tagged_with(&frame, tag) {
                frames.push(frame);
                return Ok(frames);
            }
            if let Some(text) = frame.strip_prefix(b"* BYE") {
                return Err(Error::Bye(String::from_utf8_lossy(text).trim().to_string()));
            }
            frames.push(frame);
        }
    }

    /// Writes `data` and flushes.
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Whether bytes were received that nothing has read yet.
    ///
    /// Must be false before a STARTTLS handshake, or cleartext injected ahead
    /// of it would be treated as part of the TLS session.
    #[must_use]
    pub fn has_buffered_data(&self) -> bool {
        !self.reader.buffer().is_empty()
    }

    /// Shuts down the write half.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    /// Returns the underlying stream, dropping anything buffered.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

fn is_tagged_with(frame: &[u8], tag: &str) -> bool {
    frame
        .strip_prefix(tag.as_bytes())
        .is_some_and(|rest| rest.first() == Some(&b' '))
}

/// Size of the literal announced at the end of `line`, if any.
///
/// Accepts `{123}` and the non-synchronizing `{123+}`.
fn literal_size(line: &[u8]) -> Option<usize> {
    let inner = line.strip_suffix(b"}\r\n")?;
    let inner = inner.strip_suffix(b"+").unwrap_or(inner);
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

//! Content-Length framing for protocol messages.
//!
//! Every message on a connection is prefixed by a header block:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```
//! Headers other than `Content-Length` are ignored.

use std::io::{self, BufRead, Read, Write};

use crate::errors::TransportError;

/// Largest payload accepted from a peer.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Largest header block accepted from a peer, blank line included.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

const CONTENT_LENGTH: &str = "content-length";

/// Reads framed payloads from a buffered byte stream.
pub struct MessageReader<R> {
    reader: R,
}

impl<R: BufRead> MessageReader<R> {
    /// Wraps a buffered reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next frame, blocking until it is complete.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between frames.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::MissingContentLength` if the header block has
    /// no length, `TransportError::InvalidHeader` for an unparsable header,
    /// `TransportError::FrameTooLarge` above [`MAX_FRAME_BYTES`],
    /// `TransportError::HeaderTooLarge` when the headers exceed
    /// [`MAX_HEADER_BYTES`] and
    /// `TransportError::Io` if the stream fails or ends inside a frame.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let Some(length) = self.read_headers()? else {
            return Ok(None);
        };
        if length > MAX_FRAME_BYTES {
            return Err(TransportError::FrameTooLarge {
                size: length,
                max: MAX_FRAME_BYTES,
            });
        }

        let mut payload = vec![0u8; length];
        self.reader.read_exact(&mut payload)?;
        Ok(Some(payload))
    }

    fn read_headers(&mut self) -> Result<Option<usize>, TransportError> {
        let mut content_length = None;
        let mut consumed = 0;

        loop {
            let remaining = MAX_HEADER_BYTES - consumed;
            if remaining == 0 {
                return Err(TransportError::HeaderTooLarge {
                    max: MAX_HEADER_BYTES,
                });
            }

            let mut line = Vec::new();
            let read = (&mut self.reader)
                .take(remaining as u64)
                .read_until(b'\n', &mut line)?;
            consumed += read;

            if line.last() != Some(&b'\n') {
                if consumed == 0 {
                    return Ok(None);
                }
                if consumed >= MAX_HEADER_BYTES {
                    return Err(TransportError::HeaderTooLarge {
                        max: MAX_HEADER_BYTES,
                    });
                }
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed while reading headers",
                )));
            }

            let line = std::str::from_utf8(&line).map_err(|_| TransportError::InvalidHeader)?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if let Some(length) = parse_content_length(trimmed)? {
                content_length = Some(length);
            }
        }

        content_length
            .map(Some)
            .ok_or(TransportError::MissingContentLength)
    }
}

fn parse_content_length(line: &str) -> Result<Option<usize>, TransportError> {
    let (name, value) = line.split_once(':').ok_or(TransportError::InvalidHeader)?;
    if !name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
        return Ok(None);
    }
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| TransportError::InvalidHeader)
}

/// Writes framed payloads to a byte stream.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: Write> MessageWriter<W> {
    /// Wraps a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one frame and flushes it.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Io` if writing fails.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let header = format!("Content-Length: {}\r\n\r\n", payload.len());
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(payload)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

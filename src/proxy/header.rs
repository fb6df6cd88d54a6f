//! Upstream response header parsing.
//!
//! # Responsibilities
//! - Incrementally read the status line and header block of an HTTP/1.1
//!   response from the camera
//! - Capture the status code, `content-length` and `content-type`
//! - Enforce a deadline and a maximum header block size
//!
//! # Design Decisions
//! - Hand-rolled line parser: the camera speaks plain HTTP/1.1 and the
//!   relays forward the body opaquely, so a full HTTP client has no job
//!   here
//! - Bytes read past the terminating empty line are returned to the caller
//!   as the start of the body

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout_at, Instant};

use crate::proxy::UpstreamError;

/// Upper bound on the accumulated header block. Exceeding it is a parse
/// failure, not a truncation.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoded upstream response header block.
///
/// Fields keep their "unset" sentinels (`0`, empty string) when the camera
/// never sent the corresponding line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Status code from the status line; 0 until one is parsed.
    pub status: u16,

    /// Value of `Content-Length`; 0 when absent.
    pub content_len: usize,

    /// Value of `Content-Type`, verbatim; empty when absent.
    pub content_type: String,
}

impl ResponseHeader {
    /// Whether the camera reported a success status.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Read and decode an HTTP/1.1 response header block from `source`.
///
/// Returns the decoded header and any body bytes read past the terminating
/// empty line. Fails if the empty line does not arrive within `deadline`,
/// if the block grows beyond [`MAX_HEADER_BYTES`], or if the connection
/// closes mid-block.
pub async fn read_header_block<R>(
    source: &mut R,
    deadline: Duration,
) -> Result<(ResponseHeader, Bytes), UpstreamError>
where
    R: AsyncRead + Unpin,
{
    let mut header = ResponseHeader::default();
    let mut buf = BytesMut::with_capacity(512);
    let mut block_len = 0usize;
    let give_up = Instant::now() + deadline;

    loop {
        // Drain complete lines from the front of the buffer.
        while let Some(line_end) = buf.windows(2).position(|w| w == b"\r\n") {
            let line = buf.split_to(line_end + 2);
            if line_end == 0 {
                // Empty line: end of the header block. Whatever is still
                // buffered belongs to the body.
                return Ok((header, buf.freeze()));
            }
            parse_line(&line[..line_end], &mut header);
        }

        if block_len > MAX_HEADER_BYTES {
            return Err(UpstreamError::HeaderTooLarge);
        }

        let n = timeout_at(give_up, source.read_buf(&mut buf))
            .await
            .map_err(|_| UpstreamError::HeaderTimeout)??;
        if n == 0 {
            return Err(UpstreamError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed inside header block",
            )));
        }
        block_len += n;
    }
}

/// Decode one header line.
///
/// The first line that yields a numeric token between its first two spaces
/// sets the status; until then every line is a status-line candidate, and
/// afterwards lines are treated as `key: value` headers.
fn parse_line(line: &[u8], header: &mut ResponseHeader) {
    let line = String::from_utf8_lossy(line);
    if header.status == 0 {
        if let Some(sp1) = line.find(' ') {
            if let Some(sp2) = line[sp1 + 1..].find(' ') {
                let code = &line[sp1 + 1..sp1 + 1 + sp2];
                header.status = code.parse().unwrap_or(0);
            }
        }
    } else if let Some((key, value)) = line.split_once(':') {
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "content-length" => header.content_len = value.parse().unwrap_or(0),
            "content-type" => header.content_type = value.to_string(),
            _ => {}
        }
    }
}

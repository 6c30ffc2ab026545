//! SCGI reply adaptation.
//!
//! # Responsibilities
//! - Peel the mandatory `Status: <code> <reason>` first line off the reply
//! - Synthesize `<protocol> <code> <reason>\r\n` in its place
//! - Hand the combined stream to the HTTP/1 parser
//!
//! # Design Decisions
//! - Only the first line is inspected; a `Status` header further down is not
//!   searched for
//! - The synthesized line is chained in front of the buffered reader, the
//!   stream is never rewound

use std::io::Cursor;

use bytes::Bytes;
use hyper::ext::ReasonPhrase;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::config::LimitsConfig;
use crate::error::{ScgiError, ScgiResult};
use crate::http::parser::parse_response;

/// Name of the header every SCGI reply must start with.
pub const STATUS_HEADER: &[u8] = b"Status";

/// Read an SCGI reply from `reader` as an HTTP response.
///
/// `protocol` is the request's protocol string, used for the synthesized
/// status line. `head_request` marks replies to HEAD, which carry no body.
pub async fn read_response<R>(
    reader: &mut R,
    protocol: &str,
    head_request: bool,
    limits: &LimitsConfig,
) -> ScgiResult<http::Response<Bytes>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let line = read_first_line(reader, limits.max_head_bytes).await?;
    let status = status_value(&line)?;

    let mut status_line = Vec::with_capacity(protocol.len() + status.len() + 3);
    status_line.extend_from_slice(protocol.as_bytes());
    status_line.push(b' ');
    status_line.extend_from_slice(status);
    status_line.extend_from_slice(b"\r\n");

    tracing::trace!(
        status_line = %String::from_utf8_lossy(&status_line).trim_end(),
        "Synthesized status line"
    );

    let mut combined = Cursor::new(status_line).chain(&mut *reader);
    parse_response(&mut combined, head_request, limits).await
}

/// Reason phrase of a response read by [`read_response`].
///
/// Falls back to the canonical phrase for the status code.
pub fn reason_phrase<B>(response: &http::Response<B>) -> Option<&str> {
    response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|r| std::str::from_utf8(r.as_bytes()).ok())
        .or_else(|| response.status().canonical_reason())
}

/// Read the first line, without its `\n` and optional `\r`.
async fn read_first_line<R>(reader: &mut R, max: usize) -> ScgiResult<Vec<u8>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut line = Vec::new();
    (&mut *reader)
        .take(max as u64)
        .read_until(b'\n', &mut line)
        .await
        .map_err(|e| ScgiError::io("response read", e))?;

    if line.last() != Some(&b'\n') {
        if line.len() >= max {
            return Err(ScgiError::protocol("status line too large"));
        }
        return Err(ScgiError::protocol("truncated response"));
    }
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

/// Split `Status: <value>` and return the value.
fn status_value(line: &[u8]) -> ScgiResult<&[u8]> {
    let split = line
        .windows(2)
        .position(|w| w == b": ")
        .ok_or_else(|| ScgiError::protocol("invalid status line"))?;

    let (name, rest) = line.split_at(split);
    if name != STATUS_HEADER {
        return Err(ScgiError::protocol(format!(
            "missing Status header, first line starts with {:?}",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(&rest[2..])
}

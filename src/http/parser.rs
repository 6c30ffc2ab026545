//! HTTP/1 response parsing.
//!
//! # Responsibilities
//! - Read the response head up to the blank line, bounded in size
//! - Parse status line and headers with `httparse`
//! - Frame the body: none, chunked, Content-Length, or read to EOF
//!
//! # Design Decisions
//! - The body is fully buffered into `Bytes`
//! - Chunk extensions and trailers are read and discarded
//! - Every failure is a protocol error with the cause attached

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, StatusCode, Version};
use hyper::ext::ReasonPhrase;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::config::LimitsConfig;
use crate::error::{ScgiError, ScgiResult};

/// Maximum number of response headers.
pub const MAX_HEADERS: usize = 64;

/// Parse one HTTP/1 response from `reader`.
///
/// `head_request` suppresses the body, as the reply to a HEAD request never
/// carries one.
pub async fn parse_response<R>(
    reader: &mut R,
    head_request: bool,
    limits: &LimitsConfig,
) -> ScgiResult<http::Response<Bytes>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let head = read_head(reader, limits.max_head_bytes).await?;

    let (version, status, reason, mut headers) = parse_head(&head)?;

    let body = if head_request || !status_has_body(status) {
        Bytes::new()
    } else if is_chunked(&headers) {
        headers.remove(TRANSFER_ENCODING);
        read_chunked(reader, limits).await?
    } else if let Some(len) = content_length(&headers)? {
        read_sized(reader, len, limits.max_body_bytes).await?
    } else {
        read_to_eof(reader, limits.max_body_bytes).await?
    };

    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    *response.version_mut() = version;
    *response.headers_mut() = headers;
    if !reason.is_empty() {
        let phrase = ReasonPhrase::try_from(reason.into_bytes())
            .map_err(|_| ScgiError::protocol("invalid reason phrase"))?;
        response.extensions_mut().insert(phrase);
    }
    Ok(response)
}

/// Parse the status line and headers of a complete head.
fn parse_head(head: &[u8]) -> ScgiResult<(Version, StatusCode, String, HeaderMap)> {
    let mut header_buf = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Response::new(&mut header_buf);
    match parsed.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(ScgiError::protocol("incomplete response head"));
        }
        Err(e) => return Err(ScgiError::protocol_with("invalid response head", e)),
    }

    let version = match parsed.version {
        Some(0) => Version::HTTP_10,
        _ => Version::HTTP_11,
    };
    let code = parsed.code.unwrap_or_default();
    let status = StatusCode::from_u16(code)
        .map_err(|e| ScgiError::protocol_with(format!("invalid status code {}", code), e))?;
    let reason = parsed.reason.unwrap_or_default().to_string();

    let mut headers = HeaderMap::with_capacity(parsed.headers.len());
    for header in parsed.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|e| ScgiError::protocol_with("invalid header name", e))?;
        let value = HeaderValue::from_bytes(header.value)
            .map_err(|e| ScgiError::protocol_with("invalid header value", e))?;
        headers.append(name, value);
    }
    Ok((version, status, reason, headers))
}

fn status_has_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Chunked applies when it is the last transfer coding.
fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(TRANSFER_ENCODING)
        .iter()
        .last()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
        .unwrap_or(false)
}

/// Content-Length, if present. Repeated values must agree.
fn content_length(headers: &HeaderMap) -> ScgiResult<Option<usize>> {
    let mut length = None;
    for value in headers.get_all(CONTENT_LENGTH).iter() {
        let parsed = value
            .to_str()
            .ok()
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|v| v.parse::<usize>().ok())
            .ok_or_else(|| ScgiError::protocol("invalid Content-Length"))?;
        match length {
            Some(prev) if prev != parsed => {
                return Err(ScgiError::protocol("conflicting Content-Length values"));
            }
            _ => length = Some(parsed),
        }
    }
    Ok(length)
}

/// Read up to and including the blank line ending the head.
async fn read_head<R>(reader: &mut R, max: usize) -> ScgiResult<Vec<u8>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut head = Vec::with_capacity(512);
    loop {
        let start = head.len();
        let remaining = max.saturating_sub(start);
        if remaining == 0 {
            return Err(ScgiError::protocol("response head too large"));
        }
        let n = (&mut *reader)
            .take(remaining as u64)
            .read_until(b'\n', &mut head)
            .await
            .map_err(|e| ScgiError::io("response read", e))?;
        if n == 0 {
            return Err(ScgiError::protocol("unexpected end of response head"));
        }
        if head.last() != Some(&b'\n') {
            // Either the size limit cut the line or the stream ended mid-line.
            if head.len() >= max {
                return Err(ScgiError::protocol("response head too large"));
            }
            return Err(ScgiError::protocol("unexpected end of response head"));
        }
        let line = &head[start..];
        if line == b"\r\n" || line == b"\n" {
            return Ok(head);
        }
    }
}

/// Read one line for chunked framing, without the line ending.
async fn read_line<R>(reader: &mut R, max: usize) -> ScgiResult<Vec<u8>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut line = Vec::new();
    (&mut *reader)
        .take(max as u64)
        .read_until(b'\n', &mut line)
        .await
        .map_err(|e| ScgiError::io("response read", e))?;
    if line.pop() != Some(b'\n') {
        return Err(ScgiError::protocol("unexpected end of chunked body"));
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

async fn read_chunked<R>(reader: &mut R, limits: &LimitsConfig) -> ScgiResult<Bytes>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut body = Vec::new();
    loop {
        let line = read_line(reader, limits.max_head_bytes).await?;
        let size = std::str::from_utf8(&line)
            .ok()
            .and_then(|l| l.split(';').next())
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|s| usize::from_str_radix(s, 16).ok())
            .ok_or_else(|| ScgiError::protocol("invalid chunk size"))?;

        if size == 0 {
            // Trailers run until the blank line.
            while !read_line(reader, limits.max_head_bytes).await?.is_empty() {}
            return Ok(Bytes::from(body));
        }

        if body.len().saturating_add(size) > limits.max_body_bytes {
            return Err(ScgiError::protocol("response body too large"));
        }
        let read = (&mut *reader)
            .take(size as u64)
            .read_to_end(&mut body)
            .await
            .map_err(|e| ScgiError::io("response read", e))?;
        if read < size {
            return Err(ScgiError::protocol("unexpected end of chunked body"));
        }
        if !read_line(reader, limits.max_head_bytes).await?.is_empty() {
            return Err(ScgiError::protocol("missing chunk terminator"));
        }
    }
}

async fn read_sized<R>(reader: &mut R, len: usize, max: usize) -> ScgiResult<Bytes>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    if len > max {
        return Err(ScgiError::protocol("response body too large"));
    }
    let mut body = Vec::with_capacity(len.min(64 * 1024));
    let read = (&mut *reader)
        .take(len as u64)
        .read_to_end(&mut body)
        .await
        .map_err(|e| ScgiError::io("response read", e))?;
    if read < len {
        return Err(ScgiError::protocol(format!(
            "response body truncated: expected {} bytes, got {}",
            len, read
        )));
    }
    Ok(Bytes::from(body))
}

async fn read_to_eof<R>(reader: &mut R, max: usize) -> ScgiResult<Bytes>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut body = Vec::new();
    (&mut *reader)
        .take((max as u64).saturating_add(1))
        .read_to_end(&mut body)
        .await
        .map_err(|e| ScgiError::io("response read", e))?;
    if body.len() > max {
        return Err(ScgiError::protocol("response body too large"));
    }
    Ok(Bytes::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    async fn parse(input: &[u8]) -> ScgiResult<http::Response<Bytes>> {
        let mut reader = input;
        parse_response(&mut reader, false, &LimitsConfig::default()).await
    }

    #[tokio::test]
    async fn test_content_length_body() {
        let resp = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhelloEXTRA")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.version(), Version::HTTP_11);
        assert_eq!(&resp.body()[..], b"hello");
    }

    #[tokio::test]
    async fn test_body_to_eof() {
        let resp = parse(b"HTTP/1.0 200 OK\nContent-Type: text/plain\n\nall of it")
            .await
            .unwrap();
        assert_eq!(resp.version(), Version::HTTP_10);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(&resp.body()[..], b"all of it");
    }

    #[tokio::test]
    async fn test_chunked_body() {
        let resp = parse(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4;ext=1\r\nWiki\r\n5\r\npedia\r\n0\r\nX-Trailer: t\r\n\r\n",
        )
        .await
        .unwrap();
        assert_eq!(&resp.body()[..], b"Wikipedia");
        assert!(resp.headers().get(TRANSFER_ENCODING).is_none());
    }

    #[tokio::test]
    async fn test_no_body_statuses() {
        let resp = parse(b"HTTP/1.1 204 No Content\r\nContent-Length: 3\r\n\r\nabc")
            .await
            .unwrap();
        assert!(resp.body().is_empty());

        let mut reader: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabc";
        let resp = parse_response(&mut reader, true, &LimitsConfig::default())
            .await
            .unwrap();
        assert!(resp.body().is_empty());
        assert_eq!(resp.headers()[CONTENT_LENGTH], "3");
    }

    #[tokio::test]
    async fn test_reason_phrase_kept() {
        let resp = parse(b"HTTP/1.1 299 Custom Thing\r\n\r\n").await.unwrap();
        let phrase = resp.extensions().get::<ReasonPhrase>().unwrap();
        assert_eq!(phrase.as_bytes(), b"Custom Thing");
    }

    #[tokio::test]
    async fn test_truncated_content_length() {
        let err = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_invalid_heads() {
        let inputs: [&[u8]; 5] = [
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n",
            b"garbage\r\n\r\n",
            b"HTTP/1.1 200 OK\r\nContent-Length: abc\r\n\r\n",
            b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\nab",
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n",
        ];
        for input in inputs {
            let err = parse(input).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Protocol, "input {:?}", input);
        }
    }

    #[tokio::test]
    async fn test_signed_chunk_size_rejected() {
        let inputs: [&[u8]; 3] = [
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n+5\r\nhello\r\n0\r\n\r\n",
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n-0\r\n\r\n",
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n;ext\r\n\r\n",
        ];
        for input in inputs {
            let err = parse(input).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Protocol, "input {:?}", input);
            assert!(err.to_string().contains("invalid chunk size"));
        }
    }

    #[tokio::test]
    async fn test_limits_enforced() {
        let limits = LimitsConfig {
            max_head_bytes: 32,
            max_body_bytes: 4,
        };

        let mut reader: &[u8] = b"HTTP/1.1 200 OK\r\nX-Long-Header: aaaaaaaaaaaaaaaa\r\n\r\n";
        let err = parse_response(&mut reader, false, &limits).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);

        let mut reader: &[u8] = b"HTTP/1.1 200 OK\r\n\r\ntoo long";
        let err = parse_response(&mut reader, false, &limits).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);

        let mut reader: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\n\r\n123456789";
        let err = parse_response(&mut reader, false, &limits).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }
}

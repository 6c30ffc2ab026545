//! Netstring framing: `<decimal length>:<payload>,`.
//!
//! # Responsibilities
//! - Encode arbitrary bytes as a netstring
//! - Write a netstring straight to an async writer
//! - Decode a netstring from a buffered async reader with a known upper bound
//!
//! # Design Decisions
//! - The length prefix is at most [`MAX_LENGTH_DIGITS`] digits
//! - The payload is read through `take`, so the buffer only grows with data
//!   that actually arrived

use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{FormatError, ScgiError, ScgiResult};

/// Longest accepted length prefix (`u64::MAX` has 20 digits).
pub const MAX_LENGTH_DIGITS: usize = 20;

/// Encode `data` as a netstring.
pub fn encode_netstring(data: &[u8]) -> Vec<u8> {
    let len = data.len().to_string();
    let mut out = Vec::with_capacity(len.len() + data.len() + 2);
    out.extend_from_slice(len.as_bytes());
    out.push(b':');
    out.extend_from_slice(data);
    out.push(b',');
    out
}

/// Write `data` to `writer` in netstring format.
///
/// The data is not inspected. Flushing is left to the caller.
pub async fn write_netstring<W>(writer: &mut W, data: &[u8]) -> ScgiResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let write = async {
        writer.write_all(data.len().to_string().as_bytes()).await?;
        writer.write_all(b":").await?;
        writer.write_all(data).await?;
        writer.write_all(b",").await
    };
    write
        .await
        .map_err(|e| ScgiError::io("netstring write", e))
}

/// Read one netstring from `reader` and return its payload.
pub async fn read_netstring<R>(reader: &mut R) -> ScgiResult<Vec<u8>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let count = read_length(reader).await?;

    let wanted = count
        .checked_add(1)
        .ok_or(FormatError::InvalidLength)?;
    let mut data = Vec::new();
    let read = (&mut *reader)
        .take(wanted as u64)
        .read_to_end(&mut data)
        .await
        .map_err(|e| ScgiError::io("netstring read", e))?;
    if read < wanted {
        return Err(FormatError::Truncated.into());
    }

    if data.pop() != Some(b',') {
        return Err(FormatError::MissingTerminator.into());
    }
    Ok(data)
}

/// Consume the length prefix including the `:`.
async fn read_length<R>(reader: &mut R) -> ScgiResult<usize>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut digits = Vec::with_capacity(MAX_LENGTH_DIGITS);
    loop {
        let byte = match reader.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(FormatError::Truncated.into());
            }
            Err(e) => return Err(ScgiError::io("netstring read", e)),
        };
        if byte == b':' {
            break;
        }
        if !byte.is_ascii_digit() || digits.len() == MAX_LENGTH_DIGITS {
            return Err(FormatError::InvalidLength.into());
        }
        digits.push(byte);
    }
    parse_length(&digits).ok_or_else(|| FormatError::InvalidLength.into())
}

fn parse_length(digits: &[u8]) -> Option<usize> {
    match digits {
        [] => None,
        [b'0', _, ..] => None,
        _ => std::str::from_utf8(digits).ok()?.parse().ok(),
    }
}

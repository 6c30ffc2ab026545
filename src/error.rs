//! Error taxonomy for SCGI round trips.
//!
//! Every failure carries an explicit [`ErrorKind`] tag and keeps the
//! underlying cause reachable through [`std::error::Error::source`].

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Boxed cause attached to protocol errors.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Coarse classification of a [`ScgiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Dialing the resolved target failed.
    Connection,
    /// Read or write failed on an established connection.
    Io,
    /// Malformed netstring.
    Format,
    /// Missing or invalid `Status` line, or the HTTP parser rejected the reply.
    Protocol,
    /// Address or configuration does not resolve unambiguously.
    Configuration,
}

impl ErrorKind {
    /// Short label used for metrics and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Io => "io",
            ErrorKind::Format => "format",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Netstring decoding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The length prefix is not a plain non-negative decimal integer.
    #[error("invalid length")]
    InvalidLength,

    /// The stream ended before the full netstring arrived.
    #[error("truncated")]
    Truncated,

    /// The payload is not followed by `,`.
    #[error("missing terminator")]
    MissingTerminator,
}

/// Errors produced by an SCGI round trip.
#[derive(Debug, Error)]
pub enum ScgiError {
    /// Connecting to the backend failed.
    #[error("connect to {target} failed: {source}")]
    Connection {
        target: String,
        #[source]
        source: io::Error,
    },

    /// I/O failed on an otherwise valid connection.
    #[error("{operation} failed: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// Malformed netstring.
    #[error("netstring: {0}")]
    Format(#[from] FormatError),

    /// The backend reply is not a valid SCGI response.
    #[error("protocol error: {reason}")]
    Protocol {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The address or configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ScgiError {
    /// The kind tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScgiError::Connection { .. } => ErrorKind::Connection,
            ScgiError::Io { .. } => ErrorKind::Io,
            ScgiError::Format(_) => ErrorKind::Format,
            ScgiError::Protocol { .. } => ErrorKind::Protocol,
            ScgiError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn io(operation: &'static str, source: io::Error) -> Self {
        ScgiError::Io { operation, source }
    }

    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        ScgiError::Protocol {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn protocol_with(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ScgiError::Protocol {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }
}

/// Result type for SCGI operations.
pub type ScgiResult<T> = Result<T, ScgiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        let err = ScgiError::from(FormatError::Truncated);
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.to_string(), "netstring: truncated");

        let err = ScgiError::Configuration("bad address".into());
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.kind().as_str(), "configuration");
    }

    #[test]
    fn test_source_chain_preserved() {
        let err = ScgiError::Connection {
            target: "tcp://127.0.0.1:1".into(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(err.kind(), ErrorKind::Connection);
        let source = err.source().expect("source retained");
        assert_eq!(source.to_string(), "refused");

        let err = ScgiError::protocol_with("parse failed", httparse::Error::Status);
        assert!(err.source().is_some());
        assert!(ScgiError::protocol("missing Status header").source().is_none());
    }
}

//! Target address classification.
//!
//! # Address Policy
//! Addresses are scheme-qualified URLs; the scheme itself is ignored.
//!
//! | Address                   | Result                              |
//! |---------------------------|-------------------------------------|
//! | `scgi://host:9000`        | TCP `host:9000`                     |
//! | `scgi://host`             | TCP `host:<default_port>` (80)      |
//! | `scgi:///run/app.sock`    | Unix socket `/run/app.sock`         |
//! | `scgi:run/app.sock`       | Unix socket `run/app.sock` (relative) |
//! | `scgi://host/path`        | error: host and path together       |
//! | `scgi://`                 | error: neither host nor path        |
//!
//! A path of `/` counts as no path, so `http://host/` is still TCP. Socket
//! paths are percent-decoded, so `scgi:///tmp/a%20b.sock` dials `/tmp/a b.sock`.
//! An explicit port always wins over `default_port`, even when it matches the
//! scheme's well-known port.

use std::fmt;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use url::{Host, Url};

use crate::error::{ScgiError, ScgiResult};

/// Port used when a TCP address carries none.
pub const DEFAULT_PORT: u16 = 80;

/// Where to dial the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Unix domain socket path.
    Unix(PathBuf),
    /// TCP endpoint. IPv6 hosts are stored without brackets.
    Tcp { host: String, port: u16 },
}

impl Target {
    /// Classify `address`, using `default_port` for TCP addresses without one.
    pub fn resolve(address: &str, default_port: u16) -> ScgiResult<Self> {
        let url = Url::parse(address).map_err(|e| {
            ScgiError::Configuration(format!("invalid scgi address {:?}: {}", address, e))
        })?;

        let host = match url.host() {
            Some(Host::Domain(d)) if d.is_empty() => None,
            Some(Host::Domain(d)) => Some(d.to_string()),
            Some(Host::Ipv4(ip)) => Some(ip.to_string()),
            Some(Host::Ipv6(ip)) => Some(ip.to_string()),
            None => None,
        };
        let path = match url.path() {
            "" | "/" => None,
            p => Some(p),
        };

        match (host, path) {
            (Some(host), None) => {
                // `Url::port` hides a port equal to the scheme default.
                let port = match url.port() {
                    Some(port) => port,
                    None if has_explicit_port(address) => {
                        url.port_or_known_default().unwrap_or(default_port)
                    }
                    None => default_port,
                };
                Ok(Target::Tcp { host, port })
            }
            (None, Some(path)) => Ok(Target::Unix(decode_path(path))),
            (Some(_), Some(_)) => Err(ScgiError::Configuration(format!(
                "scgi address {:?} has both a host and a path",
                address
            ))),
            (None, None) => Err(ScgiError::Configuration(format!(
                "scgi address {:?} has neither a host nor a path",
                address
            ))),
        }
    }

    /// True for Unix socket targets.
    pub fn is_unix(&self) -> bool {
        matches!(self, Target::Unix(_))
    }
}

/// Whether the authority of `address` spells out a port.
fn has_explicit_port(address: &str) -> bool {
    let Some((_, rest)) = address.split_once("://") else {
        return false;
    };
    let authority = rest
        .split(|c: char| matches!(c, '/' | '?' | '#' | '\\'))
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let port = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    port.split_once(':')
        .map(|(_, digits)| !digits.is_empty())
        .unwrap_or(false)
}

#[cfg(unix)]
fn decode_path(path: &str) -> PathBuf {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    PathBuf::from(OsString::from_vec(percent_decode_str(path).collect()))
}

#[cfg(not(unix))]
fn decode_path(path: &str) -> PathBuf {
    PathBuf::from(percent_decode_str(path).decode_utf8_lossy().into_owned())
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Unix(path) => write!(f, "unix:{}", path.display()),
            Target::Tcp { host, port } if host.contains(':') => write!(f, "tcp://[{}]:{}", host, port),
            Target::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
        }
    }
}

//! SCGI request framing.
//!
//! # Data Flow
//! ```text
//! Request
//!     → headers.rs (fixed prefix + caller headers, NUL separated)
//!     → netstring.rs (<len>:<block>,)
//!     → written to the connection, followed by the raw body
//! ```
//!
//! # Design Decisions
//! - Both stages are pure; only `write_netstring` touches a stream
//! - No validation of header content, the wire format cannot escape NUL

pub mod headers;
pub mod netstring;

pub use headers::HeaderBlock;
pub use netstring::{encode_netstring, read_netstring, write_netstring};

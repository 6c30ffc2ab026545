//! HTTP-facing side of the SCGI client.
//!
//! # Data Flow
//! ```text
//! Request (method, protocol, headers, body)
//!     → client.rs (resolve, dial, send header block + body)
//!     → response.rs (peel "Status: ..." line, synthesize status line)
//!     → parser.rs (HTTP/1 head + body framing)
//!     → http::Response<Bytes>
//! ```

pub mod client;
pub mod parser;
pub mod request;
pub mod response;

pub use client::{Client, RoundTrip};
pub use request::{Headers, Request};
pub use response::{read_response, reason_phrase};

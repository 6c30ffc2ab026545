//! SCGI client adapter.
//!
//! Sends an HTTP-style request to an SCGI backend over a Unix domain socket
//! or TCP, and reads the reply back as an `http::Response`.
//!
//! ```no_run
//! use scgi_client::{Client, Request, RoundTrip};
//!
//! # async fn run() -> Result<(), scgi_client::ScgiError> {
//! let client = Client::new();
//! let request = Request::new("GET").with_header("REQUEST_URI", "/");
//! let response = client.round_trip(request, "scgi:///run/app.sock").await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod observability;

pub use crate::config::ClientConfig;
pub use crate::error::{ErrorKind, FormatError, ScgiError, ScgiResult};
pub use crate::http::{Client, Headers, Request, RoundTrip};
pub use crate::net::Target;

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! address string ("scgi://host:port", "scgi:///path/to.sock")
//!     → target.rs (classify: Unix path or TCP endpoint)
//!     → connection.rs (dial, one connection per round trip)
//!     → handed to the round-trip client
//! ```
//!
//! # Design Decisions
//! - Classification is a pure function of the address string
//! - Ambiguous addresses are rejected instead of guessed
//! - No pooling: connections close when the round trip ends

pub mod connection;
pub mod target;

pub use connection::{Connection, ConnectionId};
pub use target::{Target, DEFAULT_PORT};

//! Tiny authoritative DNS server library.
//!
//! Answers UDP queries for a fixed zone of A and CNAME records loaded from
//! SQLite. Names outside the zone get NXDOMAIN; nothing is resolved
//! recursively or cached.

// Define modules
pub mod codec;
pub mod config;
pub mod db;
pub mod dns;
pub mod errors;
pub mod handlers;
pub mod message;
pub mod utils;
pub mod zone;

// Re-export commonly used items
pub use config::ServerConfig;
pub use dns::{process_datagram, resolve, Outcome, Resolution};
pub use errors::{DnsError, WireError};
pub use message::{DnsName, Message};
pub use zone::{Lookup, ZoneRecord, ZoneStore};

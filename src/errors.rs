//! Error types for the DNS server.
//!
//! `WireError` covers everything the codec can reject; `DnsError` is the
//! crate-level error returned by startup code and the request pipeline.

use thiserror::Error;

/// Structural problems found while decoding or encoding a DNS message.
///
/// Every decode variant means the datagram is malformed and must be dropped
/// without a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Fewer than 12 bytes were received.
    #[error("malformed packet: {len} bytes is shorter than the 12-byte header")]
    HeaderTooShort { len: usize },

    /// A field or label would read past the end of the buffer.
    #[error("malformed packet: need {needed} bytes at offset {offset}, buffer is {len} bytes")]
    UnexpectedEnd {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// A label length byte uses a reserved prefix, i.e. claims more than 63 bytes.
    #[error("malformed packet: label length byte {byte:#04x} at offset {offset}")]
    LabelTooLong { offset: usize, byte: u8 },

    /// A name is longer than 255 bytes in wire form.
    #[error("malformed packet: name longer than 255 bytes at offset {offset}")]
    NameTooLong { offset: usize },

    /// A compression pointer does not point strictly backward.
    #[error("malformed packet: pointer at offset {offset} targets {target}")]
    BadPointer { offset: usize, target: usize },

    /// A record's rdlength runs past the end of the buffer.
    #[error("malformed packet: rdata of {rdlength} bytes at offset {offset} overruns the buffer")]
    RdataOverrun { offset: usize, rdlength: usize },

    /// Rdata does not have the shape its record type requires.
    #[error("malformed packet: invalid rdata for type {typ} at offset {offset}")]
    BadRdata { typ: u16, offset: usize },

    /// A section holds more entries than a 16-bit count can describe.
    #[error("message section has {0} entries, more than a 16-bit count allows")]
    TooManyEntries(usize),

    /// Rdata is longer than a 16-bit rdlength can describe.
    #[error("rdata of {0} bytes is too long to encode")]
    RdataTooLong(usize),

    /// A textual domain name is not valid.
    #[error("not a valid DNS name: {0:?}")]
    InvalidName(String),
}

/// Represents errors that can occur in the DNS server.
#[derive(Error, Debug)]
pub enum DnsError {
    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database errors from rusqlite.
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// The datagram could not be decoded.
    #[error("{0}")]
    Malformed(#[from] WireError),

    /// The datagram has QR=1; responses are never answered.
    #[error("received a response, not a query")]
    NotAQuery,

    /// A response built by the resolver could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(WireError),

    /// Zone data is invalid or inconsistent.
    #[error("Zone error: {0}")]
    Zone(String),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Integer parsing errors.
    #[error("Parse error: {0}")]
    Parse(#[from] std::num::ParseIntError),

    /// The Prometheus exporter could not be installed.
    #[error("Metrics error: {0}")]
    Metrics(String),
}

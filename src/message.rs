//! DNS message data model.
//!
//! These types hold decoded messages and responses under construction. They
//! carry no wire logic; see [`crate::codec`] for that.

use std::fmt;
use std::net::Ipv4Addr;

use crate::errors::WireError;

/// Longest label allowed by RFC 1035.
pub const MAX_LABEL_LEN: usize = 63;

/// Longest name allowed by RFC 1035, in wire form (length bytes and the root label included).
pub const MAX_NAME_LEN: usize = 255;

/// A domain name as a sequence of labels.
///
/// The case of each label is preserved; [`DnsName::canonical`] gives the form
/// used for matching.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DnsName {
    labels: Vec<Vec<u8>>,
}

impl DnsName {
    /// The root name (`.`).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted name such as `ksaquib.surge.sh` or `ksaquib.surge.sh.`.
    ///
    /// # Errors
    /// Returns `WireError::InvalidName` for empty labels, labels longer than
    /// 63 bytes, non-ASCII input, or names longer than 255 bytes on the wire.
    pub fn parse(value: &str) -> Result<Self, WireError> {
        let invalid = || WireError::InvalidName(value.to_string());
        if !value.is_ascii() {
            return Err(invalid());
        }
        if value == "." {
            return Ok(Self::root());
        }
        let trimmed = value.strip_suffix('.').unwrap_or(value);
        if trimmed.is_empty() {
            return Err(invalid());
        }
        let mut labels = Vec::new();
        for label in trimmed.split('.') {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(invalid());
            }
            labels.push(label.as_bytes().to_vec());
        }
        Self::from_labels(labels).map_err(|_| invalid())
    }

    /// Build a name from raw labels.
    ///
    /// # Errors
    /// Returns `WireError::InvalidName` when a label is empty or too long, or the
    /// name does not fit in 255 bytes.
    pub fn from_labels(labels: Vec<Vec<u8>>) -> Result<Self, WireError> {
        let name = Self { labels };
        if name
            .labels
            .iter()
            .any(|l| l.is_empty() || l.len() > MAX_LABEL_LEN)
            || name.wire_len() > MAX_NAME_LEN
        {
            return Err(WireError::InvalidName(name.to_string()));
        }
        Ok(name)
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Length of the uncompressed wire form.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// The ASCII-lower-cased form used as a lookup key.
    pub fn canonical(&self) -> Self {
        Self {
            labels: self
                .labels
                .iter()
                .map(|l| l.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive comparison.
    pub fn matches(&self, other: &DnsName) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(&other.labels)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl fmt::Display for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return write!(f, ".");
        }
        for label in &self.labels {
            for &b in label {
                match b {
                    b'.' | b'\\' => write!(f, "\\{}", b as char)?,
                    0x21..=0x7e => write!(f, "{}", b as char)?,
                    _ => write!(f, "\\{:03}", b)?,
                }
            }
            write!(f, ".")?;
        }
        Ok(())
    }
}

/// > `OPCODE` A four bit field that specifies kind of query in this message.
/// > This value is set by the originator of a query and copied into the response.
///
/// <https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Query,
    InverseQuery,
    Status,
    Notify,
    Update,
    Reserved(u8),
}

impl Opcode {
    pub fn new(value: u8) -> Self {
        match value & 0x0F {
            0 => Opcode::Query,
            1 => Opcode::InverseQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            other => Opcode::Reserved(other),
        }
    }

    pub fn num(&self) -> u8 {
        match self {
            Opcode::Query => 0,
            Opcode::InverseQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Reserved(other) => *other & 0x0F,
        }
    }
}

/// > `RCODE` Response code - this 4 bit field is set as part of responses.
///
/// <https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Reserved(u8),
}

impl ResponseCode {
    pub fn new(value: u8) -> Self {
        match value & 0x0F {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormatError,
            2 => ResponseCode::ServerFailure,
            3 => ResponseCode::NameError,
            4 => ResponseCode::NotImplemented,
            5 => ResponseCode::Refused,
            other => ResponseCode::Reserved(other),
        }
    }

    pub fn num(&self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Reserved(other) => *other & 0x0F,
        }
    }
}

/// TYPE and QTYPE values.
///
/// Only `A` and `CNAME` records carry typed data; the rest are recognised so
/// queries for them can be answered with NODATA.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// Authoritative name server
    NS,
    /// The canonical name for an alias
    CNAME,
    /// Marks the start of a zone of authority
    SOA,
    /// Domain name pointer
    PTR,
    /// Mail exchange
    MX,
    /// Text string
    TXT,
    /// IPv6 address
    AAAA,
    /// EDNS pseudo-record
    OPT,
    /// QTYPE `*`, any record
    ANY,
    Unknown(u16),
}

impl RecordType {
    pub fn new(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            41 => RecordType::OPT,
            255 => RecordType::ANY,
            other => RecordType::Unknown(other),
        }
    }

    pub fn num(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::OPT => 41,
            RecordType::ANY => 255,
            RecordType::Unknown(other) => *other,
        }
    }
}

/// CLASS and QCLASS values. Anything other than IN is kept only to be echoed back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordClass {
    IN,
    ANY,
    Unknown(u16),
}

impl RecordClass {
    pub fn new(value: u16) -> Self {
        match value {
            1 => RecordClass::IN,
            255 => RecordClass::ANY,
            other => RecordClass::Unknown(other),
        }
    }

    pub fn num(&self) -> u16 {
        match self {
            RecordClass::IN => 1,
            RecordClass::ANY => 255,
            RecordClass::Unknown(other) => *other,
        }
    }
}

/// The header fields of a message, minus the section counts.
///
/// Counts are derived from the [`Message`] sections when encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub is_response: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub response_code: ResponseCode,
}

impl Header {
    /// A standard query header with the given id.
    pub fn query(id: u16) -> Self {
        Self {
            id,
            is_response: false,
            opcode: Opcode::Query,
            authoritative: false,
            truncated: false,
            recursion_desired: false,
            recursion_available: false,
            response_code: ResponseCode::NoError,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub name: DnsName,
    pub typ: RecordType,
    pub class: RecordClass,
}

impl Question {
    pub fn new(name: DnsName, typ: RecordType) -> Self {
        Self {
            name,
            typ,
            class: RecordClass::IN,
        }
    }
}

/// Record data, tagged by record type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Cname(DnsName),
    /// Any other type, kept as raw rdata.
    Unknown { typ: u16, rdata: Vec<u8> },
}

impl RecordData {
    pub fn typ(&self) -> RecordType {
        match self {
            RecordData::A(_) => RecordType::A,
            RecordData::Cname(_) => RecordType::CNAME,
            RecordData::Unknown { typ, .. } => RecordType::new(*typ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DnsName,
    pub class: RecordClass,
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn typ(&self) -> RecordType {
        self.data.typ()
    }
}

/// A whole DNS message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    /// A single-question standard query.
    pub fn query(id: u16, question: Question) -> Self {
        Self {
            header: Header::query(id),
            questions: vec![question],
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name() {
        let name = DnsName::parse("ksaquib.surge.sh").unwrap();
        assert_eq!(name.labels().len(), 3);
        assert_eq!(name.to_string(), "ksaquib.surge.sh.");
        assert_eq!(name, DnsName::parse("ksaquib.surge.sh.").unwrap());
        assert_eq!(DnsName::parse(".").unwrap(), DnsName::root());
        assert_eq!(DnsName::root().to_string(), ".");
    }

    #[test]
    fn test_parse_name_rejects_bad_input() {
        for bad in ["", "..", "a..b", ".a", "a\u{263A}"] {
            assert!(DnsName::parse(bad).is_err(), "{:?}", bad);
        }
        let long_label = "a".repeat(64);
        assert!(DnsName::parse(&long_label).is_err());
        assert!(DnsName::parse(&"a".repeat(63)).is_ok());

        // 4 * (63 + 1) + 1 = 257 bytes on the wire.
        let long_name = vec!["a".repeat(63); 4].join(".");
        assert!(DnsName::parse(&long_name).is_err());
    }

    #[test]
    fn test_name_case() {
        let mixed = DnsName::parse("KSaquib.Surge.SH").unwrap();
        let lower = DnsName::parse("ksaquib.surge.sh").unwrap();
        assert_ne!(mixed, lower);
        assert!(mixed.matches(&lower));
        assert_eq!(mixed.canonical(), lower);
        assert_eq!(mixed.to_string(), "KSaquib.Surge.SH.");
    }

    #[test]
    fn test_name_display_escapes() {
        let name = DnsName::from_labels(vec![b"a.b".to_vec(), vec![0x00, b'c']]).unwrap();
        assert_eq!(name.to_string(), "a\\.b.\\000c.");
    }

    #[test]
    fn test_type_numbers() {
        assert_eq!(RecordType::new(1), RecordType::A);
        assert_eq!(RecordType::new(5), RecordType::CNAME);
        assert_eq!(RecordType::new(65), RecordType::Unknown(65));
        assert_eq!(RecordType::Unknown(65).num(), 65);
        assert_eq!(RecordClass::new(3), RecordClass::Unknown(3));
        assert_eq!(Opcode::new(15), Opcode::Reserved(15));
        assert_eq!(ResponseCode::NameError.num(), 3);
    }
}

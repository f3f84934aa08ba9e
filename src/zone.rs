//! Immutable zone store.
//!
//! Holds at most one record per name. Built once at startup and shared
//! read-only between query tasks.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::errors::DnsError;
use crate::message::{DnsName, RecordClass, RecordData, RecordType, ResourceRecord};

/// Data a zone record can carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZoneData {
    A(Ipv4Addr),
    Cname(DnsName),
}

impl ZoneData {
    pub fn typ(&self) -> RecordType {
        match self {
            ZoneData::A(_) => RecordType::A,
            ZoneData::Cname(_) => RecordType::CNAME,
        }
    }
}

impl From<&ZoneData> for RecordData {
    fn from(data: &ZoneData) -> Self {
        match data {
            ZoneData::A(addr) => RecordData::A(*addr),
            ZoneData::Cname(target) => RecordData::Cname(target.clone()),
        }
    }
}

/// One entry of the zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneRecord {
    pub name: DnsName,
    pub ttl: u32,
    pub data: ZoneData,
}

impl ZoneRecord {
    /// Build a record from its textual fields.
    ///
    /// # Arguments
    /// * `name` - Owner name, e.g. `ksaquib.surge.sh`.
    /// * `record_type` - `A` or `CNAME`, case-insensitive.
    /// * `value` - An IPv4 address for `A`, a domain name for `CNAME`.
    /// * `ttl` - Time-to-live in seconds.
    ///
    /// # Returns
    /// The record, or `DnsError::Zone` describing the bad field.
    pub fn parse(name: &str, record_type: &str, value: &str, ttl: u32) -> Result<Self, DnsError> {
        let name =
            DnsName::parse(name).map_err(|e| DnsError::Zone(format!("record {name:?}: {e}")))?;
        let data = match record_type.to_ascii_uppercase().as_str() {
            "A" => ZoneData::A(value.parse().map_err(|e| {
                DnsError::Zone(format!("record {name}: bad IPv4 address {value:?}: {e}"))
            })?),
            "CNAME" => ZoneData::Cname(
                DnsName::parse(value)
                    .map_err(|e| DnsError::Zone(format!("record {name}: bad CNAME target: {e}")))?,
            ),
            other => {
                return Err(DnsError::Zone(format!(
                    "record {name}: unsupported record type {other:?}"
                )))
            }
        };
        Ok(Self { name, ttl, data })
    }

    pub fn typ(&self) -> RecordType {
        self.data.typ()
    }

    /// The answer record for a query naming `owner`.
    ///
    /// The owner name is taken from the query so its case is echoed back.
    pub fn to_resource_record(&self, owner: &DnsName) -> ResourceRecord {
        ResourceRecord {
            name: owner.clone(),
            class: RecordClass::IN,
            ttl: self.ttl,
            data: RecordData::from(&self.data),
        }
    }
}

/// Result of a zone lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The name exists with the requested type.
    Found(&'a ZoneRecord),
    /// The name exists, but with a different type.
    TypeMismatch(&'a ZoneRecord),
    /// The name is not in the zone.
    NotFound,
}

/// Mapping from canonical name to the single record for that name.
#[derive(Debug, Default)]
pub struct ZoneStore {
    records: HashMap<DnsName, ZoneRecord>,
}

impl ZoneStore {
    /// Build the store.
    ///
    /// # Errors
    /// Returns `DnsError::Zone` if two records share a name (compared
    /// case-insensitively).
    pub fn new(records: impl IntoIterator<Item = ZoneRecord>) -> Result<Self, DnsError> {
        let mut map: HashMap<DnsName, ZoneRecord> = HashMap::new();
        for record in records {
            let key = record.name.canonical();
            if let Some(existing) = map.get(&key) {
                return Err(DnsError::Zone(format!(
                    "duplicate records for {}: {:?} and {:?}",
                    key,
                    existing.typ(),
                    record.typ()
                )));
            }
            map.insert(key, record);
        }
        Ok(Self { records: map })
    }

    /// Look up `name`, reporting whether the stored record has type `typ`.
    ///
    /// A `typ` of `ANY` matches whatever record the name has.
    pub fn lookup(&self, name: &DnsName, typ: RecordType) -> Lookup<'_> {
        match self.records.get(&name.canonical()) {
            None => Lookup::NotFound,
            Some(record) if typ == RecordType::ANY || record.typ() == typ => Lookup::Found(record),
            Some(record) => Lookup::TypeMismatch(record),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneRecord> {
        self.records.values()
    }
}

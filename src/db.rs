//! Database operations for the DNS server.
//!
//! Zone records live in a SQLite table. The table is read once at startup
//! to build the [`ZoneStore`].

use log::info;
use rusqlite::{params, Connection};

use crate::errors::DnsError;
use crate::zone::{ZoneRecord, ZoneStore};

/// TTL given to seeded records and to rows inserted without one.
pub const DEFAULT_TTL: u32 = 3600;

/// Records inserted into an empty database when seeding is enabled.
pub const DEFAULT_RECORDS: &[(&str, &str, &str)] = &[
    ("ksaquib.surge.sh", "A", "1.2.3.4"),
    ("blog.ksaquib.dev", "CNAME", "saquib.com"),
];

/// Open the zone database at `db_path`.
pub fn open_db(db_path: &str) -> Result<Connection, DnsError> {
    Ok(Connection::open(db_path)?)
}

/// Initialize the DNS database.
///
/// Creates the schema if it doesn't exist and, when `seed` is set and the
/// table is empty, inserts [`DEFAULT_RECORDS`].
///
/// # Arguments
/// * `conn` - Open database connection.
/// * `seed` - Whether to populate an empty table.
///
/// # Returns
/// A `Result` indicating success or failure.
pub fn init_db(conn: &Connection, seed: bool) -> Result<(), DnsError> {
    // One record per name, so the domain alone is the key.
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS dns_records (
                domain TEXT NOT NULL COLLATE NOCASE PRIMARY KEY,
                record_type TEXT NOT NULL CHECK(record_type IN ('A','CNAME')),
                value TEXT NOT NULL,
                ttl INTEGER NOT NULL DEFAULT {DEFAULT_TTL}
            ) WITHOUT ROWID"
        ),
        [],
    )?;

    let count: i64 = conn.query_row("SELECT COUNT(*) FROM dns_records", [], |row| row.get(0))?;

    if count == 0 && seed {
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO dns_records (domain, record_type, value, ttl)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (domain, record_type, value) in DEFAULT_RECORDS {
            stmt.execute(params![domain, record_type, value, DEFAULT_TTL])?;
        }
        info!("Seeded empty zone database with {} records", DEFAULT_RECORDS.len());
    }

    Ok(())
}

/// Read every zone row.
///
/// # Arguments
/// * `conn` - Open database connection.
///
/// # Returns
/// One `ZoneRecord` per row, or the first row that does not parse.
pub fn load_records(conn: &Connection) -> Result<Vec<ZoneRecord>, DnsError> {
    let mut stmt =
        conn.prepare("SELECT domain, record_type, value, ttl FROM dns_records ORDER BY domain")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (domain, record_type, value, ttl) = row?;
        let ttl = u32::try_from(ttl)
            .map_err(|_| DnsError::Zone(format!("record {domain:?}: TTL {ttl} out of range")))?;
        records.push(ZoneRecord::parse(&domain, &record_type, &value, ttl)?);
    }
    Ok(records)
}

/// Build the zone store from the database.
pub fn load_zone(conn: &Connection) -> Result<ZoneStore, DnsError> {
    ZoneStore::new(load_records(conn)?)
}

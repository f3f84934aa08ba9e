//! Configuration for the DNS server.
//!
//! This module defines the configuration structure and methods to load
//! configuration from environment variables.

use std::{env, net::SocketAddr};

use crate::errors::DnsError;

/// Largest message carried over plain UDP (RFC 1035 section 4.2.1).
pub const MAX_PACKET_SIZE: usize = 512;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the DNS server to.
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database file holding the zone.
    pub db_path: String,

    /// Size of the receive buffer.
    pub max_packet_size: usize,

    /// Whether to seed an empty database with the default records.
    pub seed_zone: bool,

    /// Where to serve Prometheus metrics, if anywhere.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 53)),
            db_path: "dns.db".into(),
            max_packet_size: MAX_PACKET_SIZE,
            seed_zone: true,
            metrics_addr: None,
        }
    }
}

impl ServerConfig {
    /// Load server configuration from environment variables.
    ///
    /// # Returns
    /// A `Result` containing either the loaded `ServerConfig` or a `DnsError`.
    pub fn from_env() -> Result<Self, DnsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DnsError> {
        let defaults = Self::default();

        let bind_addr = match lookup("DNS_BIND") {
            Some(v) => v
                .parse()
                .map_err(|_| DnsError::Config(format!("Invalid DNS_BIND address {v:?}")))?,
            None => defaults.bind_addr,
        };

        let max_packet_size = match lookup("DNS_MAX_PACKET_SIZE") {
            Some(v) => v.trim().parse::<usize>()?,
            None => defaults.max_packet_size,
        };
        if max_packet_size < MAX_PACKET_SIZE {
            return Err(DnsError::Config(format!(
                "DNS_MAX_PACKET_SIZE must be at least {MAX_PACKET_SIZE}"
            )));
        }

        let metrics_addr = match lookup("DNS_METRICS_BIND") {
            Some(v) if !v.trim().is_empty() => Some(v.trim().parse().map_err(|_| {
                DnsError::Config(format!("Invalid DNS_METRICS_BIND address {v:?}"))
            })?),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            db_path: lookup("DNS_DB_PATH").unwrap_or(defaults.db_path),
            max_packet_size,
            seed_zone: lookup("DNS_SEED_ZONE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.seed_zone),
            metrics_addr,
        })
    }
}

//! Tiny authoritative DNS server
//!
//! Serves a fixed zone of A and CNAME records over UDP.

use std::sync::Arc;

use log::{debug, info};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;

use tiny_auth_dns::{
    config::ServerConfig,
    db::{init_db, load_zone, open_db},
    errors::DnsError,
    handlers::run_udp_server,
};

#[tokio::main]
async fn main() -> Result<(), DnsError> {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    // Load configuration from environment variables
    let config = ServerConfig::from_env()?;

    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| DnsError::Metrics(e.to_string()))?;
        info!("Prometheus metrics on http://{}/metrics", addr);
    }

    // Build the zone once; it is read-only from here on
    let conn = open_db(&config.db_path)?;
    init_db(&conn, config.seed_zone)?;
    let zone = Arc::new(load_zone(&conn)?);
    drop(conn);
    info!("Loaded {} zone records from {}", zone.len(), config.db_path);
    for record in zone.iter() {
        debug!("zone: {} {:?} ttl={}", record.name, record.data, record.ttl);
    }

    let shutdown_signal = async {
        signal::ctrl_c().await?;
        info!("Shutdown signal received");
        Ok::<(), DnsError>(())
    };

    tokio::select! {
        res = shutdown_signal => res,
        res = run_udp_server(config, zone) => res,
    }
}

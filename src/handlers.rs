//! Request handlers for the DNS server.
//!
//! This module owns the UDP socket: it receives datagrams, hands each one to
//! [`process_datagram`] on its own task, and sends back whatever comes out.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::{net::UdpSocket, task};

use crate::config::ServerConfig;
use crate::dns::process_datagram;
use crate::errors::DnsError;
use crate::zone::ZoneStore;

/// Run the UDP DNS server.
///
/// # Arguments
/// * `config` - The server configuration.
/// * `zone` - The zone to answer from.
///
/// # Returns
/// Only returns on a bind failure.
pub async fn run_udp_server(config: ServerConfig, zone: Arc<ZoneStore>) -> Result<(), DnsError> {
    let socket = UdpSocket::bind(config.bind_addr).await?;
    info!("UDP DNS server listening on {}", config.bind_addr);
    serve_udp(socket, zone, config.max_packet_size).await
}

/// Receive loop over an already bound socket.
///
/// # Arguments
/// * `socket` - The bound UDP socket.
/// * `zone` - The zone to answer from.
/// * `max_packet_size` - Size of the receive buffer.
pub async fn serve_udp(
    socket: UdpSocket,
    zone: Arc<ZoneStore>,
    max_packet_size: usize,
) -> Result<(), DnsError> {
    let socket = Arc::new(socket);
    let mut buf = vec![0u8; max_packet_size];

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((amt, src)) => {
                let query = buf[..amt].to_vec();
                let socket = socket.clone();
                let zone = zone.clone();
                task::spawn(async move {
                    if let Err(e) = handle_udp_query(query, src, socket, zone).await {
                        warn!("UDP query error: {}", e);
                    }
                });
            }
            Err(e) => error!("UDP receive error: {}", e),
        }
    }
}

/// Handle a UDP DNS query.
///
/// Malformed packets and stray responses are dropped without a reply.
///
/// # Arguments
/// * `query` - The DNS query.
/// * `src` - The source address of the query.
/// * `socket` - The UDP socket to send the response on.
/// * `zone` - The zone to answer from.
///
/// # Returns
/// An error only if sending the response failed.
pub async fn handle_udp_query(
    query: Vec<u8>,
    src: SocketAddr,
    socket: Arc<UdpSocket>,
    zone: Arc<ZoneStore>,
) -> Result<(), DnsError> {
    let response = match process_datagram(&query, &zone) {
        Ok(response) => response,
        Err(e @ (DnsError::Malformed(_) | DnsError::NotAQuery)) => {
            debug!("Dropping packet from {}: {} [{}]", src, e, hex::encode(&query));
            metrics::increment_counter!("dns_dropped_packets_total");
            return Ok(());
        }
        Err(e) => {
            error!("No response sent to {}: {}", src, e);
            return Ok(());
        }
    };

    socket.send_to(&response, src).await?;
    Ok(())
}

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::protocol::{self, DnsHeader, MAX_PACKET_SIZE};

/// Delivers an encoded query and returns the raw response.
pub trait Transport {
    fn send(&self, query: &[u8], config: &ResolverConfig) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, query: &[u8], config: &ResolverConfig) -> Result<Vec<u8>> {
        (**self).send(query, config)
    }
}

/// Blocking UDP transport. Every configured server is tried in order,
/// each with `retries + 1` attempts of `timeout` each.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTransport;

impl UdpTransport {
    pub fn new() -> UdpTransport {
        UdpTransport
    }

    fn attempt(&self, query: &[u8], server: SocketAddr, config: &ResolverConfig) -> Result<Vec<u8>> {
        let bind_addr: SocketAddr = if server.is_ipv4() {
            SocketAddr::from(([0u8; 4], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket
            .send_to(query, server)
            .map_err(|e| Error::SendFailure(format!("{}: {}", server, e)))?;

        let id = protocol::transaction_id(query);
        let deadline = Instant::now() + config.timeout();
        //XXX: Servers can respond with more than 512 bytes
        let mut recvbuf = [0u8; MAX_PACKET_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::TransportTimeout);
            }
            socket.set_read_timeout(Some(remaining))?;

            let (nbytes, from) = match socket.recv_from(&mut recvbuf) {
                Ok(received) => received,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(Error::TransportTimeout)
                }
                Err(e) => return Err(Error::SendFailure(format!("{}: {}", server, e))),
            };
            let packet = &recvbuf[..nbytes];

            let is_reply = from == server
                && protocol::transaction_id(packet) == id
                && DnsHeader::parse(&mut &packet[..]).map(|h| h.is_response()).unwrap_or(false);
            if is_reply {
                debug!(%server, bytes = nbytes, "DNS response received");
                return Ok(packet.to_vec());
            }
            debug!(%server, %from, bytes = nbytes, "discarding unrelated datagram");
        }
    }
}

impl Transport for UdpTransport {
    fn send(&self, query: &[u8], config: &ResolverConfig) -> Result<Vec<u8>> {
        let mut last_error = Error::TransportTimeout;
        for &server in config.servers() {
            for attempt in 0..=config.retries() {
                debug!(%server, attempt, bytes = query.len(), "DNS query sent");
                match self.attempt(query, server, config) {
                    Ok(response) => return Ok(response),
                    Err(e) => {
                        warn!(%server, attempt, error = %e, "DNS query attempt failed");
                        last_error = e;
                    }
                }
            }
        }
        Err(match last_error {
            e @ (Error::TransportTimeout | Error::SendFailure(_)) => e,
            other => Error::SendFailure(other.to_string()),
        })
    }
}

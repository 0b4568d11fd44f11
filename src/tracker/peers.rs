use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use serde::Serialize;

use crate::bencode::{BValue, BencodeError};
use crate::tracker::error::PeerError;

/// Size of one compact peer record: 4 address bytes then a 2 byte port.
pub const COMPACT_PEER_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Peer {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Peer {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Unpacks one 6-byte record; both fields are big-endian.
    pub fn from_compact(record: [u8; COMPACT_PEER_LEN]) -> Self {
        Self {
            ip: Ipv4Addr::new(record[0], record[1], record[2], record[3]),
            port: u16::from_be_bytes([record[4], record[5]]),
        }
    }

    pub fn to_compact(&self) -> [u8; COMPACT_PEER_LEN] {
        let [a, b, c, d] = self.ip.octets();
        let [hi, lo] = self.port.to_be_bytes();
        [a, b, c, d, hi, lo]
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip, self.port)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Decodes the compact peer format. A length that is not a multiple of 6
/// fails without returning any peers.
pub fn decode_compact_peers(bytes: &[u8]) -> Result<Vec<Peer>, PeerError> {
    if bytes.len() % COMPACT_PEER_LEN != 0 {
        return Err(PeerError::InvalidLength(bytes.len()));
    }

    let peers = bytes
        .chunks_exact(COMPACT_PEER_LEN)
        .map(|chunk| {
            let mut record = [0u8; COMPACT_PEER_LEN];
            record.copy_from_slice(chunk);
            Peer::from_compact(record)
        })
        .collect();
    Ok(peers)
}

pub fn encode_compact_peers(peers: &[Peer]) -> Vec<u8> {
    peers.iter().flat_map(|p| p.to_compact()).collect()
}

/// Decodes the verbose form: a list of dicts, each with an "ip" string and
/// a "port" integer. Entries missing either key, carrying a non-IPv4
/// address, or a port outside 0..=65535 are errors.
pub fn decode_peer_dicts(list: &[BValue]) -> Result<Vec<Peer>, PeerError> {
    list.iter()
        .enumerate()
        .map(|(index, item)| {
            let invalid = |field: &'static str, source: BencodeError| PeerError::InvalidField {
                index,
                field,
                source,
            };
            let peer_dict = item.as_dict().map_err(|e| invalid("peer", e))?;

            let ip_text = peer_dict
                .get(b"ip".as_slice())
                .ok_or(PeerError::MissingField { index, field: "ip" })?
                .as_bytes()
                .map_err(|e| invalid("ip", e))?;
            let ip_text = String::from_utf8_lossy(ip_text);
            let ip = ip_text
                .parse::<Ipv4Addr>()
                .map_err(|_| PeerError::InvalidAddress {
                    index,
                    ip: ip_text.to_string(),
                })?;

            let port = peer_dict
                .get(b"port".as_slice())
                .ok_or(PeerError::MissingField { index, field: "port" })?
                .as_integer()
                .map_err(|e| invalid("port", e))?;
            let port = u16::try_from(port).map_err(|_| PeerError::InvalidPort { index, port })?;

            Ok(Peer::new(ip, port))
        })
        .collect()
}

/// Decodes a "peers" value in either shape.
pub fn decode_peers(value: &BValue) -> Result<Vec<Peer>, PeerError> {
    match value {
        // Compact mode: each peer is 6 bytes: [IP(4), Port(2)]
        BValue::ByteString(bytes) => decode_compact_peers(bytes),
        // Non-compact: a List of dicts, each with "ip" and "port"
        BValue::List(list) => decode_peer_dicts(list),
        other => Err(PeerError::UnsupportedShape(other.kind())),
    }
}

use thiserror::Error;

use crate::bencode::{BencodeError, ValueKind};

/// Failures while unpacking a tracker's peer list. A single bad record
/// fails the whole list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeerError {
    #[error("Invalid compact peers length {0} (not a multiple of 6)")]
    InvalidLength(usize),

    #[error("Peer {index} is missing '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Peer {index} has an invalid '{field}': {source}")]
    InvalidField {
        index: usize,
        field: &'static str,
        #[source]
        source: BencodeError,
    },

    #[error("Peer {index} address '{ip}' is not an IPv4 address")]
    InvalidAddress { index: usize, ip: String },

    #[error("Peer {index} port {port} is out of range")]
    InvalidPort { index: usize, port: i64 },

    #[error("'peers' is neither a byte string nor a list, found {0}")]
    UnsupportedShape(ValueKind),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tracker response bencode error: {0}")]
    Bencode(#[from] BencodeError),

    #[error("Tracker peer list error: {0}")]
    Peers(#[from] PeerError),

    #[error("Could not build tracker query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    #[error("Tracker failure: {0}")]
    Failure(String),

    #[error("Tracker response is missing '{0}'")]
    MissingField(&'static str),

    #[error("Tracker response has an invalid '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: BencodeError,
    },

    #[error("Unsupported tracker URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Tracker does not support scrape: {0}")]
    NoScrape(String),

    #[error("Scrape response has no entry for info hash {0}")]
    UnknownInfoHash(String),
}

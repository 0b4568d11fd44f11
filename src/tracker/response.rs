use std::collections::HashMap;

use serde::Serialize;

use crate::bencode::{BValue, DecodeOptions};
use crate::tracker::error::TrackerError;
use crate::tracker::peers::{decode_peers, Peer};

/// What a tracker said in reply to an announce.
///
/// A response carrying `failure_reason` holds no other information;
/// transport failures are folded into the same field by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackerResponse {
    pub interval: i64, // seconds between regular announces
    pub min_interval: Option<i64>,
    pub complete: Option<i64>,   // seeders
    pub incomplete: Option<i64>, // leechers
    pub downloaded: Option<i64>,
    pub peers: Vec<Peer>,
    pub failure_reason: Option<String>,
    pub warning_message: Option<String>,
}

impl TrackerResponse {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            failure_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure_reason.is_some()
    }

    pub fn from_bytes(bytes: &[u8], opts: &DecodeOptions) -> Result<Self, TrackerError> {
        let (_len, bvalue) = opts.decode(bytes)?;
        Self::from_bvalue(&bvalue)
    }

    /// Extracts an announce response from the decoded top-level dictionary.
    pub fn from_bvalue(value: &BValue) -> Result<Self, TrackerError> {
        let dict = value.as_dict()?;

        // Check if the tracker returned a failure reason.
        if let Some(reason) = optional_string(dict, "failure reason")? {
            return Ok(Self::failure(reason));
        }

        // Trackers that omit "interval" leave it at 0.
        let interval = optional_integer(dict, "interval")?.unwrap_or(0);

        let peers = match dict.get(b"peers".as_slice()) {
            Some(peers_val) => decode_peers(peers_val)?,
            None => Vec::new(),
        };

        Ok(Self {
            interval,
            min_interval: optional_integer(dict, "min interval")?,
            complete: optional_integer(dict, "complete")?,
            incomplete: optional_integer(dict, "incomplete")?,
            downloaded: optional_integer(dict, "downloaded")?,
            peers,
            failure_reason: None,
            warning_message: optional_string(dict, "warning message")?,
        })
    }
}

/// Swarm counters for one torrent from a scrape response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeStats {
    pub complete: i64,
    pub incomplete: i64,
    pub downloaded: i64,
}

impl ScrapeStats {
    pub fn from_bytes(
        bytes: &[u8],
        info_hash: &[u8; 20],
        opts: &DecodeOptions,
    ) -> Result<Self, TrackerError> {
        let (_len, bvalue) = opts.decode(bytes)?;
        Self::from_bvalue(&bvalue, info_hash)
    }

    /// Looks up `files[<info_hash>]` in a decoded scrape response.
    pub fn from_bvalue(value: &BValue, info_hash: &[u8; 20]) -> Result<Self, TrackerError> {
        let dict = value.as_dict()?;

        if let Some(reason) = optional_string(dict, "failure reason")? {
            return Err(TrackerError::Failure(reason));
        }

        let files = dict
            .get(b"files".as_slice())
            .ok_or(TrackerError::MissingField("files"))?
            .as_dict()
            .map_err(|source| TrackerError::InvalidField {
                field: "files",
                source,
            })?;
        let entry = files
            .get(info_hash.as_slice())
            .ok_or_else(|| TrackerError::UnknownInfoHash(hex::encode(info_hash)))?
            .as_dict()
            .map_err(|source| TrackerError::InvalidField {
                field: "files",
                source,
            })?;

        Ok(Self {
            complete: optional_integer(entry, "complete")?.unwrap_or(0),
            incomplete: optional_integer(entry, "incomplete")?.unwrap_or(0),
            downloaded: optional_integer(entry, "downloaded")?.unwrap_or(0),
        })
    }
}

fn optional_integer(
    dict: &HashMap<Vec<u8>, BValue>,
    key: &'static str,
) -> Result<Option<i64>, TrackerError> {
    dict.get(key.as_bytes())
        .map(|v| {
            v.as_integer()
                .map_err(|source| TrackerError::InvalidField { field: key, source })
        })
        .transpose()
}

fn optional_string(
    dict: &HashMap<Vec<u8>, BValue>,
    key: &'static str,
) -> Result<Option<String>, TrackerError> {
    dict.get(key.as_bytes())
        .map(|v| {
            v.as_bytes()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .map_err(|source| TrackerError::InvalidField { field: key, source })
        })
        .transpose()
}

use std::time::Duration;

use bytes::Bytes;
use log::{debug, warn};
use reqwest::Client;
use serde::Serialize;

use crate::bencode::DecodeOptions;
use crate::tracker::error::TrackerError;
use crate::tracker::response::{ScrapeStats, TrackerResponse};
use crate::utils::url_encode_bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnounceEvent {
    Started,
    Stopped,
    Completed,
}

/// Parameters of one announce.
#[derive(Debug, Clone)]
pub struct AnnounceRequest {
    pub announce_url: String,
    pub info_hash: [u8; 20],
    pub peer_id: [u8; 20],
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub compact: bool,
    pub event: Option<AnnounceEvent>,
    pub numwant: Option<u32>,
    pub no_peer_id: Option<bool>, // ask for peer lists without peer ids
}

/// The textual query parameters. `info_hash` and `peer_id` are raw bytes
/// and get percent-encoded separately.
#[derive(Serialize)]
struct AnnounceQuery {
    port: u16,
    uploaded: u64,
    downloaded: u64,
    left: u64,
    compact: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<AnnounceEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    numwant: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_peer_id: Option<u8>,
}

fn with_query(base: &str, query: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{query}")
}

/// Builds the full announce URL for `req`.
pub fn build_announce_url(req: &AnnounceRequest) -> Result<String, TrackerError> {
    let rest = serde_urlencoded::to_string(AnnounceQuery {
        port: req.port,
        uploaded: req.uploaded,
        downloaded: req.downloaded,
        left: req.left,
        compact: u8::from(req.compact),
        event: req.event,
        numwant: req.numwant,
        no_peer_id: req.no_peer_id.map(u8::from),
    })?;

    let query = format!(
        "info_hash={info_hash}&peer_id={peer_id}&{rest}",
        info_hash = url_encode_bytes(&req.info_hash),
        peer_id = url_encode_bytes(&req.peer_id),
    );
    Ok(with_query(&req.announce_url, &query))
}

/// Derives the scrape URL from an announce URL by replacing the leading
/// `announce` of its last path segment with `scrape`. Trackers whose last
/// segment does not start with `announce` do not support scrape.
pub fn scrape_url(announce: &str) -> Option<String> {
    let (path, query) = match announce.find('?') {
        Some(q) => announce.split_at(q),
        None => (announce, ""),
    };
    let slash = path.rfind('/')?;
    let segment = &path[slash + 1..];
    let rest = segment.strip_prefix("announce")?;
    Some(format!("{}scrape{}{}", &path[..=slash], rest, query))
}

fn check_scheme(url: &str) -> Result<(), TrackerError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(TrackerError::UnsupportedScheme(url.to_string()))
    }
}

/// HTTP tracker client. Decoding of responses follows `decode_opts`.
pub struct TrackerClient {
    http: Client,
    decode_opts: DecodeOptions,
}

impl TrackerClient {
    pub fn new(timeout: Duration, decode_opts: DecodeOptions) -> Result<Self, TrackerError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, decode_opts })
    }

    /// Announces to the tracker. Any transport or decoding failure is
    /// reported through `failure_reason` rather than as an error.
    pub async fn announce(&self, req: &AnnounceRequest) -> TrackerResponse {
        match self.try_announce(req).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Announce to {} failed: {}", req.announce_url, e);
                TrackerResponse::failure(e.to_string())
            }
        }
    }

    pub async fn try_announce(&self, req: &AnnounceRequest) -> Result<TrackerResponse, TrackerError> {
        check_scheme(&req.announce_url)?;
        let url = build_announce_url(req)?;
        let body = self.fetch(&url).await?;
        TrackerResponse::from_bytes(&body, &self.decode_opts)
    }

    /// Fetches swarm counters for `info_hash` from the tracker's scrape endpoint.
    pub async fn scrape(&self, announce: &str, info_hash: &[u8; 20]) -> Result<ScrapeStats, TrackerError> {
        check_scheme(announce)?;
        let base = scrape_url(announce).ok_or_else(|| TrackerError::NoScrape(announce.to_string()))?;
        let url = with_query(&base, &format!("info_hash={}", url_encode_bytes(info_hash)));
        let body = self.fetch(&url).await?;
        ScrapeStats::from_bytes(&body, info_hash, &self.decode_opts)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, TrackerError> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        debug!("Tracker replied with {} bytes", body.len());
        Ok(body)
    }
}

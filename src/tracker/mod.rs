pub mod client;
pub mod error;
pub mod peers;
pub mod response;

pub use client::{build_announce_url, scrape_url, AnnounceEvent, AnnounceRequest, TrackerClient};
pub use error::{PeerError, TrackerError};
pub use peers::{decode_compact_peers, decode_peer_dicts, decode_peers, encode_compact_peers, Peer, COMPACT_PEER_LEN};
pub use response::{ScrapeStats, TrackerResponse};

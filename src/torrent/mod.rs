pub mod error;
pub mod infohash;
pub mod metadata;

pub use error::TorrentError;
pub use infohash::{calculate_info_hash, HASH_LEN};
pub use metadata::{get_integer, get_string, FileInfo, Torrent, TorrentInfo};

// lib.rs - Library interface for the torrent inspector

pub mod bencode;
pub mod config;
pub mod torrent;
pub mod tracker;
pub mod utils;

// Re-export commonly used types
pub use bencode::{bvalue_to_json, decode_bencode, decode_exact, encode_bvalue, BValue, BencodeError, DecodeOptions};
pub use config::Config;
pub use torrent::{FileInfo, Torrent, TorrentError, TorrentInfo};
pub use tracker::{decode_compact_peers, decode_peers, Peer, PeerError, TrackerResponse};

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn pieces() -> Vec<u8> {
        let mut p = Vec::new();
        for b in [b'a', b'b', b'c'] {
            p.extend(std::iter::repeat(b).take(20));
        }
        p
    }

    // A multi-file torrent as a torrent creator might write it, with the
    // info keys out of order and an announce-list.
    fn torrent_bytes() -> Vec<u8> {
        let mut raw = b"d8:announce18:http://t1/announce13:announce-listll18:http://t1/announceel18:http://t2/announceee".to_vec();
        raw.extend_from_slice(b"7:comment4:test4:infod4:name4:demo12:piece lengthi16e6:pieces60:");
        raw.extend_from_slice(&pieces());
        raw.extend_from_slice(b"5:filesl");
        raw.extend_from_slice(b"d6:lengthi10e4:pathl3:dir5:a.txtee");
        raw.extend_from_slice(b"d6:lengthi20e4:pathl3:dir5:b.txtee");
        raw.extend_from_slice(b"d6:lengthi5e4:pathl5:c.txtee");
        raw.extend_from_slice(b"eee");
        raw
    }

    #[test]
    fn test_torrent_end_to_end() {
        let torrent = Torrent::from_bytes(&torrent_bytes(), &DecodeOptions::default()).unwrap();

        assert_eq!(
            torrent.announce_urls,
            vec!["http://t1/announce", "http://t1/announce", "http://t2/announce"]
        );
        assert_eq!(torrent.comment.as_deref(), Some("test"));
        assert_eq!(torrent.info.name, "demo");
        assert_eq!(torrent.info.total_length, 35);
        assert_eq!(
            torrent.info.files.iter().map(|f| f.offset).collect::<Vec<_>>(),
            vec![0, 10, 30]
        );
        assert_eq!(torrent.num_pieces(), 3);
        // SHA-1 of the canonically re-encoded info dictionary.
        assert_eq!(
            torrent.info_hash_hex(),
            "9d6defc59fa8430bbecb87bf74c17d8ea28ba8bc"
        );
    }

    #[test]
    fn test_reencoding_is_idempotent() {
        let value = decode_exact(&torrent_bytes()).unwrap();
        let once = encode_bvalue(&value);
        let twice = encode_bvalue(&decode_exact(&once).unwrap());
        assert_eq!(once, twice);
        assert_ne!(once, torrent_bytes());
    }

    #[test]
    fn test_decode_simple_bencode() {
        let value = decode_exact(b"li1ei2ee").unwrap();
        assert_eq!(bvalue_to_json(&value), serde_json::json!([1, 2]));

        let value = decode_exact(b"d3:fooi42ee").unwrap();
        assert_eq!(bvalue_to_json(&value), serde_json::json!({"foo": 42}));
    }

    #[test]
    fn test_decode_invalid_bencode() {
        assert!(decode_bencode(b"d").is_err());
        assert!(decode_bencode(b"4:ab").is_err());
        assert!(decode_bencode(b"invalid").is_err());
    }

    #[test]
    fn test_tracker_response_with_compact_peers() {
        let mut body = b"d8:intervali900e5:peers6:".to_vec();
        body.extend_from_slice(&[0x7f, 0x00, 0x00, 0x01, 0x1a, 0xe1]);
        body.push(b'e');

        let response = TrackerResponse::from_bytes(&body, &DecodeOptions::default()).unwrap();
        assert_eq!(response.interval, 900);
        assert_eq!(response.peers, vec![Peer::new(Ipv4Addr::new(127, 0, 0, 1), 6881)]);
    }
}

// infohash.rs
use crate::bencode::{encode_bvalue, BValue};

use sha1::{Digest, Sha1};

/// Length of a SHA-1 digest, both for the info hash and each piece hash.
pub const HASH_LEN: usize = 20;

/// SHA-1 over the canonical encoding of the decoded "info" dictionary.
///
/// Because the encoder sorts keys, an info dictionary whose keys arrived
/// out of order hashes the same as its canonically ordered twin.
pub fn calculate_info_hash(info: &BValue) -> [u8; HASH_LEN] {
    let encoded = encode_bvalue(info);

    let mut hasher = Sha1::new();
    hasher.update(&encoded);
    let result = hasher.finalize();

    let mut hash_bytes = [0u8; HASH_LEN];
    hash_bytes.copy_from_slice(&result);
    hash_bytes
}

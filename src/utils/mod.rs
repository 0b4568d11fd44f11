mod url_encode;

pub use url_encode::url_encode_bytes;
use rand::Rng;

/// Builds a 20-byte peer id: `prefix` (truncated to 20 bytes) followed by
/// random ASCII digits.
pub fn generate_peer_id(prefix: &str) -> [u8; 20] {
	let mut rng = rand::thread_rng();
	let mut peer_id = [0u8; 20];
	let prefix = &prefix.as_bytes()[..prefix.len().min(20)];
	peer_id[..prefix.len()].copy_from_slice(prefix);
	for b in &mut peer_id[prefix.len()..] {
		*b = b'0' + rng.gen_range(0..10);
	}
	peer_id
}

use serde_json::{json, Map, Value};

use super::BValue;

/// Encode a `BValue` into its canonical bencoded form.
///
/// Dictionary keys are written in ascending byte order whatever order they
/// were inserted or decoded in, so two equal trees always produce identical
/// bytes. Encoding cannot fail.
pub fn encode_bvalue(value: &BValue) -> Vec<u8> {
	let mut out = Vec::new();
	encode_into(value, &mut out);
	out
}

/// Appends the canonical encoding of `value` to `out`.
pub fn encode_into(value: &BValue, out: &mut Vec<u8>) {
	match value {
		BValue::Integer(i) => {
			out.push(b'i');
			out.extend_from_slice(i.to_string().as_bytes());
			out.push(b'e');
		}
		BValue::ByteString(bytes) => encode_bytes(bytes, out),
		BValue::List(items) => {
			out.push(b'l');
			for item in items {
				encode_into(item, out);
			}
			out.push(b'e');
		}
		BValue::Dict(dict) => {
			out.push(b'd');
			let mut entries: Vec<(&Vec<u8>, &BValue)> = dict.iter().collect();
			entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
			for (key, val) in entries {
				encode_bytes(key, out);
				encode_into(val, out);
			}
			out.push(b'e');
		}
	}
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
	out.extend_from_slice(bytes.len().to_string().as_bytes());
	out.push(b':');
	out.extend_from_slice(bytes);
}

const BYTES_HEX_MARKER: &str = "_bytes_hex";

/// Convert a `BValue` into JSON (using Serde JSON `Value`).
///
/// - `Integer(i)` => JSON number
/// - `ByteString(bytes)` => string if UTF-8, otherwise `{"_bytes_hex": "..."}`
/// - `List(...)` => JSON array
/// - `Dict(...)` => JSON object; non-UTF-8 keys become `"_bytes_hex:<hex>"`
///
/// The rendering is for display. A UTF-8 key that happens to spell a marked
/// hex key collides with it, and the later entry wins.
pub fn bvalue_to_json(bv: &BValue) -> Value {
	match bv {
		BValue::Integer(i) => json!(i),
		BValue::ByteString(bytes) => match std::str::from_utf8(bytes) {
			Ok(utf8_str) => Value::String(utf8_str.to_string()),
			Err(_) => json!({ BYTES_HEX_MARKER: hex::encode(bytes) }),
		},
		BValue::List(list_items) => Value::Array(list_items.iter().map(bvalue_to_json).collect()),
		BValue::Dict(map) => {
			let mut json_map = Map::new();
			for (k, v) in map {
				let key = match std::str::from_utf8(k) {
					Ok(s) => s.to_string(),
					Err(_) => format!("{}:{}", BYTES_HEX_MARKER, hex::encode(k)),
				};
				json_map.insert(key, bvalue_to_json(v));
			}
			Value::Object(json_map)
		}
	}
}

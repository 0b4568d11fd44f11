use std::collections::HashMap;
use std::fmt;

use super::error::BencodeError;

/// A decoded bencode node.
///
/// Dictionary keys are raw bytes: tracker scrape responses key their
/// entries by binary info hash, so they cannot be assumed to be UTF-8.
/// The map carries no ordering; the encoder sorts keys when writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BValue {
	Integer(i64),
	ByteString(Vec<u8>), // raw bytes for any string
	List(Vec<BValue>),
	Dict(HashMap<Vec<u8>, BValue>),
}

/// The variant of a `BValue`, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
	Integer,
	ByteString,
	List,
	Dict,
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ValueKind::Integer => "integer",
			ValueKind::ByteString => "byte string",
			ValueKind::List => "list",
			ValueKind::Dict => "dictionary",
		};
		f.write_str(name)
	}
}

impl BValue {
	/// Builds a byte string from UTF-8 text.
	pub fn string(s: &str) -> Self {
		BValue::ByteString(s.as_bytes().to_vec())
	}

	/// Builds a dictionary from `(key, value)` pairs. Later duplicates win.
	pub fn dict<K, I>(entries: I) -> Self
	where
		K: Into<Vec<u8>>,
		I: IntoIterator<Item = (K, BValue)>,
	{
		BValue::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}

	pub fn kind(&self) -> ValueKind {
		match self {
			BValue::Integer(_) => ValueKind::Integer,
			BValue::ByteString(_) => ValueKind::ByteString,
			BValue::List(_) => ValueKind::List,
			BValue::Dict(_) => ValueKind::Dict,
		}
	}

	pub fn is_integer(&self) -> bool {
		matches!(self, BValue::Integer(_))
	}

	pub fn is_bytes(&self) -> bool {
		matches!(self, BValue::ByteString(_))
	}

	pub fn is_list(&self) -> bool {
		matches!(self, BValue::List(_))
	}

	pub fn is_dict(&self) -> bool {
		matches!(self, BValue::Dict(_))
	}

	pub fn as_integer(&self) -> Result<i64, BencodeError> {
		match self {
			BValue::Integer(i) => Ok(*i),
			other => Err(other.mismatch(ValueKind::Integer)),
		}
	}

	pub fn as_bytes(&self) -> Result<&[u8], BencodeError> {
		match self {
			BValue::ByteString(b) => Ok(b),
			other => Err(other.mismatch(ValueKind::ByteString)),
		}
	}

	/// Views a byte string as UTF-8 text.
	pub fn as_str(&self) -> Result<&str, BencodeError> {
		std::str::from_utf8(self.as_bytes()?).map_err(|_| BencodeError::InvalidUtf8)
	}

	pub fn as_list(&self) -> Result<&[BValue], BencodeError> {
		match self {
			BValue::List(l) => Ok(l),
			other => Err(other.mismatch(ValueKind::List)),
		}
	}

	pub fn as_dict(&self) -> Result<&HashMap<Vec<u8>, BValue>, BencodeError> {
		match self {
			BValue::Dict(d) => Ok(d),
			other => Err(other.mismatch(ValueKind::Dict)),
		}
	}

	/// Looks up `key` if this is a dictionary.
	pub fn get(&self, key: &[u8]) -> Option<&BValue> {
		match self {
			BValue::Dict(d) => d.get(key),
			_ => None,
		}
	}

	fn mismatch(&self, expected: ValueKind) -> BencodeError {
		BencodeError::TypeMismatch {
			expected,
			found: self.kind(),
		}
	}
}

impl From<i64> for BValue {
	fn from(i: i64) -> Self {
		BValue::Integer(i)
	}
}

impl From<&str> for BValue {
	fn from(s: &str) -> Self {
		BValue::string(s)
	}
}

impl From<Vec<u8>> for BValue {
	fn from(b: Vec<u8>) -> Self {
		BValue::ByteString(b)
	}
}

impl From<Vec<BValue>> for BValue {
	fn from(l: Vec<BValue>) -> Self {
		BValue::List(l)
	}
}

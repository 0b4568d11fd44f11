use thiserror::Error;

use super::bvalue::ValueKind;

/// Failures raised while decoding bencode or reading a decoded tree.
///
/// Offsets are byte positions into the buffer passed to the decoder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BencodeError {
	#[error("Unexpected end of input at byte {position}")]
	UnexpectedEnd { position: usize },

	#[error("String at byte {position} declares {declared} bytes but only {available} remain")]
	StringOverrun {
		position: usize,
		declared: usize,
		available: usize,
	},

	#[error("Missing ':' after string length at byte {position}")]
	MissingColon { position: usize },

	#[error("Malformed string length at byte {position}: {reason}")]
	MalformedLength { position: usize, reason: String },

	#[error("Invalid integer at byte {position}: {reason}")]
	InvalidInteger { position: usize, reason: String },

	#[error("Unterminated {container} starting at byte {position} (missing 'e')")]
	Unterminated {
		container: &'static str,
		position: usize,
	},

	#[error("Dictionary key at byte {position} has no value")]
	MissingValue { position: usize },

	#[error("Unexpected byte 0x{byte:02x} at byte {position}")]
	UnexpectedByte { byte: u8, position: usize },

	#[error("Nesting deeper than {max_depth} levels at byte {position}")]
	NestingTooDeep { max_depth: usize, position: usize },

	#[error("Trailing data after value at byte {position}")]
	TrailingData { position: usize },

	#[error("Duplicate dictionary key at byte {position}")]
	DuplicateKey { position: usize },

	#[error("Dictionary key out of order at byte {position}")]
	UnsortedKey { position: usize },

	#[error("Type mismatch: expected {expected}, found {found}")]
	TypeMismatch { expected: ValueKind, found: ValueKind },

	#[error("Byte string is not valid UTF-8")]
	InvalidUtf8,
}

impl BencodeError {
	/// True when the input was cut short rather than malformed, i.e. more
	/// bytes could have turned this into a successful decode.
	pub fn is_truncated(&self) -> bool {
		matches!(
			self,
			BencodeError::UnexpectedEnd { .. }
				| BencodeError::StringOverrun { .. }
				| BencodeError::Unterminated { .. }
		)
	}
}

use std::collections::HashMap;

use super::error::BencodeError;
use crate::bencode::bvalue::BValue;

/// Nesting limit applied when no explicit one is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Decoder settings.
///
/// `max_depth` bounds how many containers may be open at once, so hostile
/// input cannot drive recursion arbitrarily deep. With `strict_dict_keys`
/// set, dictionaries whose keys are repeated or not in ascending byte order
/// are rejected instead of accepted with last-write-wins semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
	pub max_depth: usize,
	pub strict_dict_keys: bool,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			strict_dict_keys: false,
		}
	}
}

impl DecodeOptions {
	pub fn strict() -> Self {
		Self {
			strict_dict_keys: true,
			..Self::default()
		}
	}

	/// Decodes one value starting at `pos`, returning the cursor just past it.
	pub fn decode_at(&self, input: &[u8], pos: usize) -> Result<(usize, BValue), BencodeError> {
		let mut parser = Parser {
			input,
			pos,
			opts: self,
		};
		let value = parser.value(0)?;
		Ok((parser.pos, value))
	}

	/// Decodes one value from the start of `input`, returning the number of
	/// bytes consumed. Anything after the value is ignored.
	pub fn decode(&self, input: &[u8]) -> Result<(usize, BValue), BencodeError> {
		self.decode_at(input, 0)
	}

	/// Decodes `input` as exactly one value.
	pub fn decode_exact(&self, input: &[u8]) -> Result<BValue, BencodeError> {
		let (consumed, value) = self.decode(input)?;
		if consumed != input.len() {
			return Err(BencodeError::TrailingData { position: consumed });
		}
		Ok(value)
	}
}

/// Decodes one value from the start of `input` with default options.
pub fn decode_bencode(input: &[u8]) -> Result<(usize, BValue), BencodeError> {
	DecodeOptions::default().decode(input)
}

/// Decodes `input` as exactly one value with default options.
pub fn decode_exact(input: &[u8]) -> Result<BValue, BencodeError> {
	DecodeOptions::default().decode_exact(input)
}

struct Parser<'a> {
	input: &'a [u8],
	pos: usize,
	opts: &'a DecodeOptions,
}

impl<'a> Parser<'a> {
	fn peek(&self) -> Option<u8> {
		self.input.get(self.pos).copied()
	}

	/// `depth` counts the containers enclosing the value about to be read.
	fn value(&mut self, depth: usize) -> Result<BValue, BencodeError> {
		match self.peek() {
			None => Err(BencodeError::UnexpectedEnd { position: self.pos }),
			Some(b'i') => self.integer(),
			Some(b'l') => {
				self.enter(depth)?;
				self.list(depth + 1)
			}
			Some(b'd') => {
				self.enter(depth)?;
				self.dict(depth + 1)
			}
			Some(c) if c.is_ascii_digit() => self.string().map(BValue::ByteString),
			Some(c) => Err(BencodeError::UnexpectedByte {
				byte: c,
				position: self.pos,
			}),
		}
	}

	fn enter(&self, depth: usize) -> Result<(), BencodeError> {
		if depth >= self.opts.max_depth {
			return Err(BencodeError::NestingTooDeep {
				max_depth: self.opts.max_depth,
				position: self.pos,
			});
		}
		Ok(())
	}

	/// Scans a run of ASCII digits, returning the slice.
	fn digits(&mut self) -> &'a [u8] {
		let input = self.input;
		let start = self.pos;
		while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
			self.pos += 1;
		}
		&input[start..self.pos]
	}

	/// Decodes `i<digits>e`. Leading zeros and `-0` are rejected so that
	/// every accepted integer re-encodes to the same bytes.
	fn integer(&mut self) -> Result<BValue, BencodeError> {
		let start = self.pos;
		self.pos += 1; // skip 'i'

		let body_start = self.pos;
		let negative = self.peek() == Some(b'-');
		if negative {
			self.pos += 1;
		}
		let digits = self.digits();

		match self.peek() {
			None => return Err(BencodeError::UnexpectedEnd { position: self.pos }),
			Some(b'e') => {}
			Some(b) => {
				return Err(BencodeError::InvalidInteger {
					position: self.pos,
					reason: format!("unexpected byte 0x{:02x}", b),
				})
			}
		}

		let invalid = |reason: &str| BencodeError::InvalidInteger {
			position: start,
			reason: reason.to_string(),
		};
		if digits.is_empty() {
			return Err(invalid("no digits"));
		}
		if digits.len() > 1 && digits[0] == b'0' {
			return Err(invalid("leading zeros are not allowed"));
		}
		if negative && digits == b"0" {
			return Err(invalid("negative zero is not allowed"));
		}

		// Only '-' and ASCII digits were consumed, so this cannot fail.
		let num_str = std::str::from_utf8(&self.input[body_start..self.pos])
			.map_err(|_| invalid("non-ASCII data"))?;
		let parsed = num_str
			.parse::<i64>()
			.map_err(|e| invalid(&format!("'{}': {}", num_str, e)))?;

		self.pos += 1; // skip 'e'
		Ok(BValue::Integer(parsed))
	}

	/// Decodes `<length>:<bytes>`.
	fn string(&mut self) -> Result<Vec<u8>, BencodeError> {
		let start = self.pos;
		let digits = self.digits();

		match self.peek() {
			None => return Err(BencodeError::UnexpectedEnd { position: self.pos }),
			Some(b':') => {}
			Some(_) => return Err(BencodeError::MissingColon { position: self.pos }),
		}

		let malformed = |reason: String| BencodeError::MalformedLength {
			position: start,
			reason,
		};
		if digits.is_empty() {
			return Err(malformed("no digits".to_string()));
		}
		if digits.len() > 1 && digits[0] == b'0' {
			return Err(malformed("leading zeros are not allowed".to_string()));
		}
		let length = std::str::from_utf8(digits)
			.map_err(|e| malformed(e.to_string()))?
			.parse::<usize>()
			.map_err(|e| malformed(e.to_string()))?;

		self.pos += 1; // skip ':'
		let available = self.input.len() - self.pos;
		if length > available {
			return Err(BencodeError::StringOverrun {
				position: start,
				declared: length,
				available,
			});
		}

		let data = self.input[self.pos..self.pos + length].to_vec();
		self.pos += length;
		Ok(data)
	}

	/// Decodes `l<items>e`.
	fn list(&mut self, depth: usize) -> Result<BValue, BencodeError> {
		let start = self.pos;
		self.pos += 1; // skip 'l'

		let mut items = Vec::new();
		loop {
			match self.peek() {
				None => {
					return Err(BencodeError::Unterminated {
						container: "list",
						position: start,
					})
				}
				Some(b'e') => break,
				Some(_) => items.push(self.value(depth)?),
			}
		}

		self.pos += 1; // skip 'e'
		Ok(BValue::List(items))
	}

	/// Decodes `d<key><value>...e`.
	fn dict(&mut self, depth: usize) -> Result<BValue, BencodeError> {
		let start = self.pos;
		self.pos += 1; // skip 'd'

		let unterminated = BencodeError::Unterminated {
			container: "dictionary",
			position: start,
		};
		let mut map = HashMap::new();
		let mut last_key: Option<Vec<u8>> = None;

		loop {
			let key_pos = self.pos;
			let key = match self.peek() {
				None => return Err(unterminated),
				Some(b'e') => break,
				Some(c) if c.is_ascii_digit() => self.string()?,
				// Dictionary keys must be byte strings
				Some(c) => {
					return Err(BencodeError::UnexpectedByte {
						byte: c,
						position: key_pos,
					})
				}
			};

			if self.opts.strict_dict_keys {
				if let Some(prev) = &last_key {
					if key == *prev {
						return Err(BencodeError::DuplicateKey { position: key_pos });
					}
					if key < *prev {
						return Err(BencodeError::UnsortedKey { position: key_pos });
					}
				}
				last_key = Some(key.clone());
			}

			match self.peek() {
				None => return Err(unterminated),
				Some(b'e') => return Err(BencodeError::MissingValue { position: key_pos }),
				Some(_) => {}
			}
			let value = self.value(depth)?;
			map.insert(key, value);
		}

		self.pos += 1; // skip 'e'
		Ok(BValue::Dict(map))
	}
}

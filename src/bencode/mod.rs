pub mod bvalue;
pub mod decode;
pub mod encode;
pub mod error;

pub use bvalue::{BValue, ValueKind};   // re-export
pub use decode::{decode_bencode, decode_exact, DecodeOptions, DEFAULT_MAX_DEPTH};   // re-export
pub use encode::{bvalue_to_json, encode_bvalue, encode_into};   // re-export
pub use error::BencodeError;

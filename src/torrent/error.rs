use thiserror::Error;

use crate::bencode::BencodeError;

#[derive(Debug, Error)]
pub enum TorrentError {
    #[error("Bencode error: {0}")]
    Bencode(#[from] BencodeError),

    #[error("Missing '{0}'")]
    MissingField(String),

    #[error("Invalid '{field}': {source}")]
    InvalidField {
        field: String,
        #[source]
        source: BencodeError,
    },

    #[error("'{field}' must not be negative, got {value}")]
    NegativeValue { field: String, value: i64 },

    #[error("Total length of files overflows")]
    LengthOverflow,

    #[error("Piece index {index} out of range ({count} pieces)")]
    PieceIndexOutOfRange { index: usize, count: usize },

    #[error("I/O error while reading torrent: {0}")]
    Io(#[from] std::io::Error),
}

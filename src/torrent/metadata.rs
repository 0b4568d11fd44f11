use std::{collections::HashMap, fs, path::Path};

use serde::{Serialize, Serializer};

use crate::bencode::{BValue, BencodeError, DecodeOptions};
use crate::torrent::error::TorrentError;
use crate::torrent::infohash::{calculate_info_hash, HASH_LEN};

/// Separator used when joining multi-file path segments.
pub const PATH_SEPARATOR: &str = "/";

/// Represents a .torrent file: tracker URLs, the content description and
/// the info hash identifying it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Torrent {
    pub announce_urls: Vec<String>, // "announce" followed by flattened "announce-list"
    pub info: TorrentInfo,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub creation_date: Option<i64>, // seconds since the Unix epoch
    #[serde(serialize_with = "serialize_hex")]
    pub info_hash: [u8; HASH_LEN],
}

/// Contains detailed metadata about the torrent's content.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TorrentInfo {
    pub name: String,
    pub piece_length: u64,
    #[serde(serialize_with = "serialize_hex")]
    pub pieces: Vec<u8>, // concatenated 20-byte SHA-1 digests
    pub files: Vec<FileInfo>,
    pub total_length: u64,
    pub multi_file: bool, // laid out from a "files" list
}

/// One file of the torrent, positioned within the concatenated content.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub length: u64,
    pub offset: u64,
}

impl Torrent {
    /// Reads a .torrent file from disk and parses its contents.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TorrentError> {
        let buf = fs::read(path)?;
        Self::from_bytes(&buf, &DecodeOptions::default())
    }

    /// Decodes raw .torrent bytes. Bytes after the root dictionary are ignored.
    pub fn from_bytes(buf: &[u8], opts: &DecodeOptions) -> Result<Self, TorrentError> {
        let (_consumed, bvalue) = opts.decode(buf)?;
        Self::from_bvalue(&bvalue)
    }

    /// Creates a `Torrent` from a `BValue` (the result of a bencode parse).
    pub fn from_bvalue(value: &BValue) -> Result<Self, TorrentError> {
        let root_dict = value.as_dict()?;

        let announce_urls = parse_announce_urls(root_dict)?;

        let info_value = lookup(root_dict, "info")?;
        let info_dict = info_value.as_dict().map_err(|e| invalid("info", e))?;
        let info = TorrentInfo::from_bvalue(info_dict)?;
        let info_hash = calculate_info_hash(info_value);

        Ok(Torrent {
            announce_urls,
            info,
            comment: get_optional_string(root_dict, "comment")?,
            created_by: get_optional_string(root_dict, "created by")?,
            creation_date: root_dict
                .get(b"creation date".as_slice())
                .map(|v| v.as_integer().map_err(|e| invalid("creation date", e)))
                .transpose()?,
            info_hash,
        })
    }

    pub fn info_hash_hex(&self) -> String {
        hex::encode(self.info_hash)
    }

    /// The first tracker to contact, if the torrent names any.
    pub fn primary_announce(&self) -> Option<&str> {
        self.announce_urls.first().map(String::as_str)
    }

    pub fn num_pieces(&self) -> usize {
        self.info.num_pieces()
    }

    pub fn piece_hash(&self, index: usize) -> Result<&[u8], TorrentError> {
        self.info.piece_hash(index)
    }

    pub fn piece_hashes(&self) -> impl Iterator<Item = &[u8]> {
        self.info.piece_hashes()
    }
}

impl TorrentInfo {
    pub fn from_bvalue(info_dict: &HashMap<Vec<u8>, BValue>) -> Result<Self, TorrentError> {
        let name = get_string(info_dict, "name")?;
        let piece_length = get_integer(info_dict, "piece length")?;
        let pieces = lookup_bytestring(info_dict, "pieces")?.to_vec();

        let multi_file = info_dict.contains_key(b"files".as_slice());
        let (files, total_length) = match info_dict.get(b"files".as_slice()) {
            Some(files) => parse_files(files)?,
            None => {
                // Single file: the torrent name is the path.
                let length = get_integer(info_dict, "length")?;
                let file = FileInfo {
                    path: name.clone(),
                    length,
                    offset: 0,
                };
                (vec![file], length)
            }
        };

        Ok(TorrentInfo {
            name,
            piece_length,
            pieces,
            files,
            total_length,
            multi_file,
        })
    }

    /// Number of whole 20-byte digests in `pieces`.
    pub fn num_pieces(&self) -> usize {
        self.pieces.len() / HASH_LEN
    }

    /// Every complete 20-byte digest, in piece order.
    pub fn piece_hashes(&self) -> impl Iterator<Item = &[u8]> {
        self.pieces.chunks_exact(HASH_LEN)
    }

    /// The digest of piece `index`.
    pub fn piece_hash(&self, index: usize) -> Result<&[u8], TorrentError> {
        let count = self.num_pieces();
        if index >= count {
            return Err(TorrentError::PieceIndexOutOfRange { index, count });
        }
        let start = index * HASH_LEN;
        Ok(&self.pieces[start..start + HASH_LEN])
    }
}

/// "announce" first, then every URL of "announce-list" in tier order.
fn parse_announce_urls(root: &HashMap<Vec<u8>, BValue>) -> Result<Vec<String>, TorrentError> {
    let mut urls = Vec::new();

    if let Some(announce) = get_optional_string(root, "announce")? {
        urls.push(announce);
    }

    if let Some(tiers) = root.get(b"announce-list".as_slice()) {
        let tiers = tiers.as_list().map_err(|e| invalid("announce-list", e))?;
        for (t, tier) in tiers.iter().enumerate() {
            let tier = tier
                .as_list()
                .map_err(|e| invalid(&format!("announce-list[{}]", t), e))?;
            for (u, url) in tier.iter().enumerate() {
                let url = url
                    .as_bytes()
                    .map_err(|e| invalid(&format!("announce-list[{}][{}]", t, u), e))?;
                urls.push(String::from_utf8_lossy(url).into_owned());
            }
        }
    }

    Ok(urls)
}

/// Multi-file layout: offsets are the running sum of lengths in list order.
fn parse_files(files: &BValue) -> Result<(Vec<FileInfo>, u64), TorrentError> {
    let entries = files.as_list().map_err(|e| invalid("files", e))?;

    let mut result = Vec::with_capacity(entries.len());
    let mut offset: u64 = 0;

    for (i, entry) in entries.iter().enumerate() {
        let field = |name: &str| format!("files[{}].{}", i, name);
        let file_dict = entry
            .as_dict()
            .map_err(|e| invalid(&format!("files[{}]", i), e))?;

        let length = match file_dict.get(b"length".as_slice()) {
            Some(v) => non_negative(&field("length"), v)?,
            None => return Err(TorrentError::MissingField(field("length"))),
        };

        let segments = match file_dict.get(b"path".as_slice()) {
            Some(v) => v.as_list().map_err(|e| invalid(&field("path"), e))?,
            None => return Err(TorrentError::MissingField(field("path"))),
        };
        if segments.is_empty() {
            return Err(TorrentError::MissingField(field("path")));
        }
        let parts = segments
            .iter()
            .map(|s| {
                s.as_bytes()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .map_err(|e| invalid(&field("path"), e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        result.push(FileInfo {
            path: parts.join(PATH_SEPARATOR),
            length,
            offset,
        });
        offset = offset
            .checked_add(length)
            .ok_or(TorrentError::LengthOverflow)?;
    }

    Ok((result, offset))
}

fn invalid(field: &str, source: BencodeError) -> TorrentError {
    TorrentError::InvalidField {
        field: field.to_string(),
        source,
    }
}

fn non_negative(field: &str, value: &BValue) -> Result<u64, TorrentError> {
    let n = value.as_integer().map_err(|e| invalid(field, e))?;
    u64::try_from(n).map_err(|_| TorrentError::NegativeValue {
        field: field.to_string(),
        value: n,
    })
}

fn lookup<'a>(dict: &'a HashMap<Vec<u8>, BValue>, key: &str) -> Result<&'a BValue, TorrentError> {
    dict.get(key.as_bytes())
        .ok_or_else(|| TorrentError::MissingField(key.to_string()))
}

/// Looks up a key in the dictionary and returns a byte slice if the value is a ByteString.
pub fn lookup_bytestring<'a>(
    dict: &'a HashMap<Vec<u8>, BValue>,
    key: &str,
) -> Result<&'a [u8], TorrentError> {
    lookup(dict, key)?
        .as_bytes()
        .map_err(|e| invalid(key, e))
}

/// Gets a ByteString from the dictionary as text. Invalid UTF-8 sequences
/// are replaced rather than rejected.
pub fn get_string(dict: &HashMap<Vec<u8>, BValue>, key: &str) -> Result<String, TorrentError> {
    let bytes = lookup_bytestring(dict, key)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// Like `get_string`, but an absent key yields `None`.
pub fn get_optional_string(
    dict: &HashMap<Vec<u8>, BValue>,
    key: &str,
) -> Result<Option<String>, TorrentError> {
    match dict.get(key.as_bytes()) {
        Some(_) => get_string(dict, key).map(Some),
        None => Ok(None),
    }
}

/// Retrieves a non-negative integer value from the dictionary.
pub fn get_integer(dict: &HashMap<Vec<u8>, BValue>, key: &str) -> Result<u64, TorrentError> {
    non_negative(key, lookup(dict, key)?)
}

fn serialize_hex<T, S>(bytes: T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::{decode_exact, encode_bvalue, ValueKind};

    fn pieces() -> Vec<u8> {
        let mut p = Vec::new();
        for b in [b'a', b'b', b'c'] {
            p.extend(std::iter::repeat(b).take(20));
        }
        p
    }

    fn single_file_info() -> BValue {
        BValue::dict([
            ("name", BValue::string("demo.txt")),
            ("piece length", BValue::Integer(16)),
            ("pieces", BValue::ByteString(pieces())),
            ("length", BValue::Integer(35)),
        ])
    }

    fn file(path: &[&str], length: i64) -> BValue {
        BValue::dict([
            ("length", BValue::Integer(length)),
            (
                "path",
                BValue::List(path.iter().map(|s| BValue::string(s)).collect()),
            ),
        ])
    }

    fn multi_file_info() -> BValue {
        BValue::dict([
            ("name", BValue::string("demo")),
            ("piece length", BValue::Integer(16)),
            ("pieces", BValue::ByteString(pieces())),
            (
                "files",
                BValue::List(vec![
                    file(&["dir", "a.txt"], 10),
                    file(&["dir", "b.txt"], 20),
                    file(&["c.txt"], 5),
                ]),
            ),
        ])
    }

    fn root(info: BValue) -> BValue {
        BValue::dict([
            ("announce", BValue::string("http://tracker.example/announce")),
            ("info", info),
        ])
    }

    #[test]
    fn test_single_file() {
        let torrent = Torrent::from_bvalue(&root(single_file_info())).unwrap();
        assert_eq!(torrent.info.name, "demo.txt");
        assert_eq!(torrent.info.piece_length, 16);
        assert_eq!(torrent.info.total_length, 35);
        assert_eq!(
            torrent.info.files,
            vec![FileInfo {
                path: "demo.txt".to_string(),
                length: 35,
                offset: 0
            }]
        );
        assert!(!torrent.info.multi_file);
        assert_eq!(
            torrent.info_hash_hex(),
            "0502934393560ee9bb7f78bb28bbac6ee8695f1b"
        );
        assert_eq!(torrent.comment, None);
        assert_eq!(torrent.created_by, None);
        assert_eq!(torrent.creation_date, None);
    }

    #[test]
    fn test_multi_file_offsets() {
        let torrent = Torrent::from_bvalue(&root(multi_file_info())).unwrap();
        let info = &torrent.info;

        let offsets: Vec<u64> = info.files.iter().map(|f| f.offset).collect();
        let paths: Vec<&str> = info.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(offsets, vec![0, 10, 30]);
        assert_eq!(paths, vec!["dir/a.txt", "dir/b.txt", "c.txt"]);
        assert_eq!(info.total_length, 35);
        assert_eq!(
            info.files.iter().map(|f| f.length).sum::<u64>(),
            info.total_length
        );
        assert!(info.multi_file);
        assert_eq!(
            torrent.info_hash_hex(),
            "9d6defc59fa8430bbecb87bf74c17d8ea28ba8bc"
        );
    }

    #[test]
    fn test_piece_hashes() {
        let torrent = Torrent::from_bvalue(&root(single_file_info())).unwrap();
        assert_eq!(torrent.num_pieces(), 3);
        assert_eq!(torrent.piece_hash(0).unwrap(), &[b'a'; 20]);
        assert_eq!(torrent.piece_hash(2).unwrap(), &[b'c'; 20]);
        assert!(matches!(
            torrent.piece_hash(3),
            Err(TorrentError::PieceIndexOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_partial_trailing_piece_is_not_counted() {
        let mut info = single_file_info();
        if let BValue::Dict(d) = &mut info {
            let mut p = pieces();
            p.extend_from_slice(&[0u8; 7]);
            d.insert(b"pieces".to_vec(), BValue::ByteString(p));
        }
        let torrent = Torrent::from_bvalue(&root(info)).unwrap();
        assert_eq!(torrent.num_pieces(), 3);
        assert!(torrent.piece_hash(3).is_err());

        let hashes: Vec<&[u8]> = torrent.piece_hashes().collect();
        assert_eq!(hashes.len(), 3);
        assert_eq!(hashes[1], &[b'b'; 20]);
    }

    #[test]
    fn test_announce_urls_flattened_in_tier_order() {
        let value = BValue::dict([
            ("announce", BValue::string("http://a/announce")),
            (
                "announce-list",
                BValue::List(vec![
                    BValue::List(vec![
                        BValue::string("http://a/announce"),
                        BValue::string("http://b/announce"),
                    ]),
                    BValue::List(vec![BValue::string("udp://c:80")]),
                ]),
            ),
            ("info", single_file_info()),
        ]);
        let torrent = Torrent::from_bvalue(&value).unwrap();
        assert_eq!(
            torrent.announce_urls,
            vec!["http://a/announce", "http://a/announce", "http://b/announce", "udp://c:80"]
        );
        assert_eq!(torrent.primary_announce(), Some("http://a/announce"));
    }

    #[test]
    fn test_no_announce_is_allowed() {
        let value = BValue::dict([("info", single_file_info())]);
        let torrent = Torrent::from_bvalue(&value).unwrap();
        assert!(torrent.announce_urls.is_empty());
        assert_eq!(torrent.primary_announce(), None);
    }

    #[test]
    fn test_optional_fields() {
        let value = BValue::dict([
            ("comment", BValue::string("hello")),
            ("created by", BValue::string("mktorrent 1.1")),
            ("creation date", BValue::Integer(1_700_000_000)),
            ("info", single_file_info()),
        ]);
        let torrent = Torrent::from_bvalue(&value).unwrap();
        assert_eq!(torrent.comment.as_deref(), Some("hello"));
        assert_eq!(torrent.created_by.as_deref(), Some("mktorrent 1.1"));
        assert_eq!(torrent.creation_date, Some(1_700_000_000));
    }

    #[test]
    fn test_root_must_be_dict() {
        let err = Torrent::from_bvalue(&BValue::List(vec![])).unwrap_err();
        assert!(matches!(
            err,
            TorrentError::Bencode(BencodeError::TypeMismatch {
                expected: ValueKind::Dict,
                found: ValueKind::List
            })
        ));
    }

    #[test]
    fn test_missing_info() {
        let value = BValue::dict([("announce", BValue::string("http://a"))]);
        assert!(matches!(
            Torrent::from_bvalue(&value),
            Err(TorrentError::MissingField(f)) if f == "info"
        ));
    }

    #[test]
    fn test_missing_single_file_length() {
        let mut info = single_file_info();
        if let BValue::Dict(d) = &mut info {
            d.remove(b"length".as_slice());
        }
        assert!(matches!(
            Torrent::from_bvalue(&root(info)),
            Err(TorrentError::MissingField(f)) if f == "length"
        ));
    }

    #[test]
    fn test_wrong_field_types() {
        let mut info = single_file_info();
        if let BValue::Dict(d) = &mut info {
            d.insert(b"piece length".to_vec(), BValue::string("16"));
        }
        assert!(matches!(
            Torrent::from_bvalue(&root(info)),
            Err(TorrentError::InvalidField { field, .. }) if field == "piece length"
        ));

        let value = BValue::dict([
            ("announce-list", BValue::List(vec![BValue::string("http://a")])),
            ("info", single_file_info()),
        ]);
        assert!(matches!(
            Torrent::from_bvalue(&value),
            Err(TorrentError::InvalidField { field, .. }) if field == "announce-list[0]"
        ));
    }

    #[test]
    fn test_negative_file_length() {
        let info = BValue::dict([
            ("name", BValue::string("demo")),
            ("piece length", BValue::Integer(16)),
            ("pieces", BValue::ByteString(pieces())),
            ("files", BValue::List(vec![file(&["a"], 1), file(&["b"], -1)])),
        ]);
        assert!(matches!(
            Torrent::from_bvalue(&root(info)),
            Err(TorrentError::NegativeValue { field, value: -1 }) if field == "files[1].length"
        ));
    }

    #[test]
    fn test_unsorted_info_keys_hash_canonically() {
        let canonical = encode_bvalue(&root(single_file_info()));
        let sorted = Torrent::from_bytes(&canonical, &DecodeOptions::default()).unwrap();

        let mut shuffled = b"d8:announce31:http://tracker.example/announce4:infod".to_vec();
        shuffled.extend_from_slice(b"6:pieces60:");
        shuffled.extend_from_slice(&pieces());
        shuffled.extend_from_slice(b"12:piece lengthi16e4:name8:demo.txt6:lengthi35ee");
        shuffled.push(b'e');
        let decoded = decode_exact(&shuffled).unwrap();
        let reordered = Torrent::from_bvalue(&decoded).unwrap();

        assert_eq!(sorted.info_hash, reordered.info_hash);
        assert_eq!(sorted, reordered);
        // Strict decoding refuses the same bytes.
        assert!(Torrent::from_bytes(&shuffled, &DecodeOptions::strict()).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.torrent");
        std::fs::write(&path, encode_bvalue(&root(multi_file_info()))).unwrap();

        let torrent = Torrent::from_file(&path).unwrap();
        assert_eq!(torrent.info.name, "demo");
        assert_eq!(torrent.info.files.len(), 3);

        assert!(matches!(
            Torrent::from_file(dir.path().join("missing.torrent")),
            Err(TorrentError::Io(_))
        ));
    }

    #[test]
    fn test_serializes_hashes_as_hex() {
        let torrent = Torrent::from_bvalue(&root(single_file_info())).unwrap();
        let json = serde_json::to_value(&torrent).unwrap();
        assert_eq!(json["info_hash"], "0502934393560ee9bb7f78bb28bbac6ee8695f1b");
        assert_eq!(json["info"]["pieces"].as_str().unwrap().len(), 120);
    }
}

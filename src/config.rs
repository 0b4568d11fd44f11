use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::bencode::{DecodeOptions, DEFAULT_MAX_DEPTH};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "rusbit.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub peer_id_prefix: String,
    pub listen_port: u16,
    pub request_timeout: u64, // seconds
    pub numwant: Option<u32>,
    pub max_decode_depth: usize,
    pub strict_dict_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peer_id_prefix: "-RB0001-".to_string(),
            listen_port: 6881,
            request_timeout: 10, // seconds
            numwant: None,
            max_decode_depth: DEFAULT_MAX_DEPTH,
            strict_dict_keys: false,
        }
    }
}

impl Config {
    /// Reads the config at `path`. A missing file yields the defaults;
    /// keys absent from the file keep their default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            max_depth: self.max_decode_depth,
            strict_dict_keys: self.strict_dict_keys,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

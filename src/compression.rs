//! Payload compression applied by the UDP and HTTP senders.

use std::io::{self, Write};

use flate2::{
    Compression as Level,
    write::{GzEncoder, ZlibEncoder},
};
use serde::{Deserialize, Serialize};

/// Compression method for a GELF payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compression {
    None,
    #[default]
    Gzip,
    Zlib,
}

impl Compression {
    /// Compress `payload`, returning a fresh buffer.
    pub fn compress(self, payload: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Compression::None => Ok(payload.to_vec()),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 2), Level::default());
                encoder.write_all(payload)?;
                encoder.finish()
            }
            Compression::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2), Level::default());
                encoder.write_all(payload)?;
                encoder.finish()
            }
        }
    }

    /// Value for the HTTP `Content-Encoding` header, if any.
    pub fn content_encoding(self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gzip"),
            Compression::Zlib => Some("deflate"),
        }
    }
}

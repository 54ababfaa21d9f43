use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("image has no origin word")]
    MissingOrigin,

    #[error("image ends in the middle of a word")]
    TrailingByte,
}

/// A parsed program image: an origin address and the words to place there,
/// in order. On disk both are big-endian.
pub struct Image {
    pub origin: u16,
    pub words: Vec<u16>,
}

impl Image {
    pub fn parse(bytes: &[u8]) -> Result<Image, ImageError> {
        if bytes.len() < 2 {
            return Err(ImageError::MissingOrigin);
        }
        if bytes.len() % 2 != 0 {
            return Err(ImageError::TrailingByte);
        }

        let origin = u16::from_be_bytes([bytes[0], bytes[1]]);
        let words = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Image { origin, words })
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Image, ImageError> {
        Self::parse(&fs::read(path)?)
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Structural problems found while validating a BMP file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BmpError {
    #[error("can't read the BMP header, need {needed} bytes but found {found}")]
    TruncatedHeader { needed: usize, found: usize },
    #[error("not a BMP file")]
    NotABmpFile,
    #[error("invalid size of BMP file ({0} bytes)")]
    FileTooSmall(u32),
    /// Pixel data offset points at or beyond the declared file size
    #[error("invalid header of BMP file, pixel offset {offset} is outside the file size {file_size}")]
    InvalidHeader { offset: u32, file_size: u32 },
    #[error("invalid/unsupported header of BMP file, DIB header size is {0}")]
    UnsupportedHeader(u32),
    #[error("invalid image width in BMP file")]
    InvalidWidth,
    #[error("invalid image height in BMP file")]
    InvalidHeight,
    #[error("invalid image size in BMP file ({width} x {height} doesn't fit in {file_size} bytes)")]
    InvalidImageSize {
        width: u32,
        height: u32,
        file_size: u32,
    },
    #[error("not an 8-bit BMP file ({0} bits per pixel)")]
    UnsupportedBitDepth(u16),
    #[error("not an uncompressed BMP file (compression method {0})")]
    UnsupportedCompression(u32),
    /// A palette or pixel region runs past the end of the loaded bytes
    #[error("can't read the BMP {section}, need {needed} bytes but only {available} are available")]
    TruncatedData {
        section: &'static str,
        needed: u64,
        available: u64,
    },
}

/// Anything that can stop a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("the file {} is not a valid or supported BMP file: {source}", .path.display())]
    Bmp {
        path: PathBuf,
        #[source]
        source: BmpError,
    },
    #[error("can't {action} file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Argument(String),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, action: &'static str, source: io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            action,
            source,
        }
    }
}

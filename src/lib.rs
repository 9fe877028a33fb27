//! Conversion of uncompressed 8-bit BMP files into raw ZX Spectrum Next
//! images (`.nxi`) and palettes (`.nxp`).
//!
//! The BMP palette's RGB888 colors become RGB333 colors, stored as an RGB332
//! byte followed by a byte holding the lowest blue bit. The pixel indexes are
//! repacked as 8 or 4 bits per pixel, in rows or in columns.
//!
//! ```no_run
//! use std::path::Path;
//! use nxiconvert::{convert_file, ConversionOptions, OutputPaths};
//!
//! fn main() -> Result<(), nxiconvert::ConvertError> {
//!     let options = ConversionOptions::default();
//!     let paths = OutputPaths::resolve(Path::new("title.bmp"), None, options.palette)?;
//!     let report = convert_file(&paths, &options)?;
//!     println!("{} x {} -> {}", report.width, report.height, report.paths.image.display());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod options;
pub mod output;
pub mod preview;
pub mod reader;
pub mod transcode;

pub use error::{BmpError, ConvertError};
pub use options::{BitDepth, ConversionOptions, Layout, PalettePlacement, RepackMode, ToolVariant};
pub use output::{
    ConversionReport, Converted, OutputPaths, convert_bytes, convert_file, default_output_path,
    palette_path, write_outputs,
};
pub use reader::{BmpHeader, BmpPaletteEntry, SourceImage};
pub use transcode::{RawImage, RawPalette, Rgb333};

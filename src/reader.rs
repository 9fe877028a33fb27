//! Validation and parsing of uncompressed 8-bit BMP files.
//!
//! Only the fields needed to find the color table and the pixel rows are read:
//! a 14 byte file header followed by at least a BITMAPINFOHEADER.
//!
//! ```text
//!  offset  size  field
//!       0     2  magic "BM"
//!       2     4  file size
//!      10     4  pixel data offset
//!      14     4  DIB header size
//!      18     4  width
//!      22     4  height (negative means top-to-bottom rows)
//!      28     2  bits per pixel
//!      30     4  compression method
//! ```

use dataview::{DataView, Pod};
use log::{debug, trace};

use crate::error::BmpError;

pub const FILE_HEADER_SIZE: usize = 14;
pub const MIN_DIB_HEADER_SIZE: u32 = 40;
pub const HEADER_SIZE: usize = 54;
/// Smallest plausible 8-bit BMP: the headers plus a full 256 entry color table
pub const MIN_BMP_FILE_SIZE: u32 = 1082;
pub const PALETTE_ENTRIES: usize = 256;
pub const PALETTE_SIZE: usize = PALETTE_ENTRIES * 4;

fn read_field<T: Pod>(bytes: &[u8], offset: usize) -> Result<T, BmpError> {
    DataView::from(bytes)
        .try_read::<T>(offset)
        .ok_or(BmpError::TruncatedHeader {
            needed: offset + core::mem::size_of::<T>(),
            found: bytes.len(),
        })
}

pub fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, BmpError> {
    read_field::<u16>(bytes, offset).map(u16::from_le)
}

pub fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, BmpError> {
    read_field::<u32>(bytes, offset).map(u32::from_le)
}

pub fn read_i32(bytes: &[u8], offset: usize) -> Result<i32, BmpError> {
    read_field::<i32>(bytes, offset).map(i32::from_le)
}

/// One color table entry, in the order BMP stores it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[derive(dataview::Pod)]
#[repr(C)]
pub struct BmpPaletteEntry {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub reserved: u8,
}

impl BmpPaletteEntry {
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            blue,
            green,
            red,
            reserved: 0,
        }
    }
}

/// The validated header fields of a BMP file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BmpHeader {
    pub file_size: u32,
    pub pixel_offset: u32,
    pub palette_offset: u32,
    pub width: u32,
    pub height: i32,
}

impl BmpHeader {
    /// Validate the fixed header region, checking each field in file order.
    pub fn parse(bytes: &[u8]) -> Result<Self, BmpError> {
        if bytes.len() < HEADER_SIZE {
            return Err(BmpError::TruncatedHeader {
                needed: HEADER_SIZE,
                found: bytes.len(),
            });
        }

        if &bytes[0..2] != b"BM" {
            return Err(BmpError::NotABmpFile);
        }

        let file_size = read_u32(bytes, 2)?;
        if file_size < MIN_BMP_FILE_SIZE {
            return Err(BmpError::FileTooSmall(file_size));
        }

        let pixel_offset = read_u32(bytes, 10)?;
        if pixel_offset >= file_size {
            return Err(BmpError::InvalidHeader {
                offset: pixel_offset,
                file_size,
            });
        }

        let dib_header_size = read_u32(bytes, 14)?;
        if dib_header_size < MIN_DIB_HEADER_SIZE {
            return Err(BmpError::UnsupportedHeader(dib_header_size));
        }
        // The color table follows the DIB header directly.
        let palette_offset = (FILE_HEADER_SIZE as u32).saturating_add(dib_header_size);

        let width = read_i32(bytes, 18)?;
        if width == 0 {
            return Err(BmpError::InvalidWidth);
        }
        let width = width.unsigned_abs();

        let height = read_i32(bytes, 22)?;
        if height == 0 {
            return Err(BmpError::InvalidHeight);
        }

        if u64::from(width) * u64::from(height.unsigned_abs()) >= u64::from(file_size) {
            return Err(BmpError::InvalidImageSize {
                width,
                height: height.unsigned_abs(),
                file_size,
            });
        }

        let bpp = read_u16(bytes, 28)?;
        if bpp != 8 {
            return Err(BmpError::UnsupportedBitDepth(bpp));
        }

        let compression = read_u32(bytes, 30)?;
        if compression != 0 {
            return Err(BmpError::UnsupportedCompression(compression));
        }

        trace!(
            "BMP header: file size {file_size}, pixel offset {pixel_offset}, DIB header size {dib_header_size}"
        );

        Ok(Self {
            file_size,
            pixel_offset,
            palette_offset,
            width,
            height,
        })
    }

    /// Rows are stored bottom-to-top unless the height is negative.
    pub fn bottom_to_top(&self) -> bool {
        self.height > 0
    }

    pub fn rows(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Width rounded up to the next multiple of 4 bytes.
    pub fn padded_row_width(&self) -> u32 {
        // `width` comes from an i32 so this can't overflow.
        (self.width + 3) & !0x03
    }
}

/// A validated BMP, with its color table decoded and its pixel rows located.
#[derive(Debug, Clone)]
pub struct SourceImage<'a> {
    header: BmpHeader,
    palette: Vec<BmpPaletteEntry>,
    pixels: &'a [u8],
}

impl<'a> SourceImage<'a> {
    /// Validate `bytes` and locate the image data in them.
    ///
    /// The color table is only decoded when `with_palette` is set. It is then
    /// always the full 256 entry region, regardless of how many colors are used.
    pub fn from_bytes(bytes: &'a [u8], with_palette: bool) -> Result<Self, BmpError> {
        let header = BmpHeader::parse(bytes)?;

        let padded = u64::from(header.padded_row_width());
        let image_size = padded * u64::from(header.rows());
        if image_size >= u64::from(header.file_size) {
            return Err(BmpError::InvalidImageSize {
                width: header.width,
                height: header.rows(),
                file_size: header.file_size,
            });
        }

        let palette = if with_palette {
            let region = region(bytes, "palette", header.palette_offset, PALETTE_SIZE as u64)?;
            let view = DataView::from(region);
            (0..PALETTE_ENTRIES)
                .map(|i| view.try_read::<BmpPaletteEntry>(i * 4))
                .collect::<Option<Vec<_>>>()
                .ok_or(BmpError::TruncatedData {
                    section: "palette",
                    needed: PALETTE_SIZE as u64,
                    available: region.len() as u64,
                })?
        } else {
            Vec::new()
        };

        let pixels = region(bytes, "image data", header.pixel_offset, image_size)?;

        debug!(
            "BMP image {} x {}, {} rows, padded row width {}",
            header.width,
            header.rows(),
            if header.bottom_to_top() { "bottom-to-top" } else { "top-to-bottom" },
            padded
        );

        Ok(Self {
            header,
            palette,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Number of pixel rows, whatever order they are stored in.
    pub fn height(&self) -> u32 {
        self.header.rows()
    }

    /// The decoded color table, empty if it wasn't requested.
    pub fn palette(&self) -> &[BmpPaletteEntry] {
        &self.palette
    }

    /// Pixel rows in display order (top row first), without their padding.
    pub fn display_rows(&self) -> impl ExactSizeIterator<Item = &'a [u8]> + '_ {
        let rows = self.height() as usize;
        let padded = self.header.padded_row_width() as usize;
        let width = self.width() as usize;
        let bottom_to_top = self.header.bottom_to_top();
        let pixels = self.pixels;

        (0..rows).map(move |y| {
            let stored = if bottom_to_top { rows - 1 - y } else { y };
            let start = stored * padded;
            &pixels[start..start + width]
        })
    }
}

fn region<'a>(
    bytes: &'a [u8],
    section: &'static str,
    offset: u32,
    len: u64,
) -> Result<&'a [u8], BmpError> {
    let start = u64::from(offset);
    let end = start + len;
    if end > bytes.len() as u64 {
        return Err(BmpError::TruncatedData {
            section,
            needed: end,
            available: bytes.len() as u64,
        });
    }
    Ok(&bytes[start as usize..end as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: i32, height: i32, bpp: u16, compression: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[0..2].copy_from_slice(b"BM");
        bytes[2..6].copy_from_slice(&4096u32.to_le_bytes());
        bytes[10..14].copy_from_slice(&1078u32.to_le_bytes());
        bytes[14..18].copy_from_slice(&40u32.to_le_bytes());
        bytes[18..22].copy_from_slice(&width.to_le_bytes());
        bytes[22..26].copy_from_slice(&height.to_le_bytes());
        bytes[26..28].copy_from_slice(&1u16.to_le_bytes());
        bytes[28..30].copy_from_slice(&bpp.to_le_bytes());
        bytes[30..34].copy_from_slice(&compression.to_le_bytes());
        bytes
    }

    #[test]
    fn accessors_read_little_endian() {
        let bytes = [0x34, 0x12, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(read_u16(&bytes, 0), Ok(0x1234));
        assert_eq!(read_i32(&bytes, 2), Ok(-1));
        assert_eq!(read_u32(&bytes, 1), Ok(0xffff_ff12));
        assert!(matches!(read_u32(&bytes, 4), Err(BmpError::TruncatedHeader { needed: 8, .. })));
    }

    #[test]
    fn parses_valid_header() {
        let parsed = BmpHeader::parse(&header(5, -3, 8, 0)).unwrap();
        assert_eq!(parsed.width, 5);
        assert_eq!(parsed.height, -3);
        assert_eq!(parsed.rows(), 3);
        assert!(!parsed.bottom_to_top());
        assert_eq!(parsed.padded_row_width(), 8);
        assert_eq!(parsed.palette_offset, 54);
        assert_eq!(parsed.pixel_offset, 1078);
    }

    #[test]
    fn rejects_in_validation_order() {
        assert!(matches!(
            BmpHeader::parse(&[0u8; 53]),
            Err(BmpError::TruncatedHeader { needed: 54, found: 53 })
        ));

        let mut bytes = header(4, 4, 8, 0);
        bytes[0..2].copy_from_slice(b"XY");
        assert_eq!(BmpHeader::parse(&bytes), Err(BmpError::NotABmpFile));

        let mut bytes = header(4, 4, 8, 0);
        bytes[2..6].copy_from_slice(&1081u32.to_le_bytes());
        assert_eq!(BmpHeader::parse(&bytes), Err(BmpError::FileTooSmall(1081)));

        let mut bytes = header(4, 4, 8, 0);
        bytes[10..14].copy_from_slice(&4096u32.to_le_bytes());
        assert!(matches!(BmpHeader::parse(&bytes), Err(BmpError::InvalidHeader { .. })));

        let mut bytes = header(4, 4, 8, 0);
        bytes[14..18].copy_from_slice(&12u32.to_le_bytes());
        assert_eq!(BmpHeader::parse(&bytes), Err(BmpError::UnsupportedHeader(12)));

        assert_eq!(BmpHeader::parse(&header(0, 4, 8, 0)), Err(BmpError::InvalidWidth));
        assert_eq!(BmpHeader::parse(&header(4, 0, 8, 0)), Err(BmpError::InvalidHeight));
        assert!(matches!(
            BmpHeader::parse(&header(64, 64, 8, 0)),
            Err(BmpError::InvalidImageSize { width: 64, height: 64, file_size: 4096 })
        ));
        assert_eq!(BmpHeader::parse(&header(4, 4, 24, 0)), Err(BmpError::UnsupportedBitDepth(24)));
        assert_eq!(BmpHeader::parse(&header(4, 4, 8, 1)), Err(BmpError::UnsupportedCompression(1)));
    }

    #[test]
    fn bad_magic_wins_over_later_errors() {
        let mut bytes = header(0, 0, 24, 1);
        bytes[0] = b'X';
        assert_eq!(BmpHeader::parse(&bytes), Err(BmpError::NotABmpFile));
    }

    #[test]
    fn missing_pixel_data_is_reported() {
        let mut bytes = header(4, 4, 8, 0);
        bytes.resize(1078 + 8, 0);
        let err = SourceImage::from_bytes(&bytes, true).unwrap_err();
        assert_eq!(
            err,
            BmpError::TruncatedData {
                section: "image data",
                needed: 1078 + 16,
                available: 1078 + 8
            }
        );
    }

    #[test]
    fn padded_rows_must_fit_in_file_size() {
        let mut bytes = header(1, 1000, 8, 0);
        bytes[2..6].copy_from_slice(&2000u32.to_le_bytes());
        bytes.resize(5200, 0);
        // 1 x 1000 passes the unpadded check, 4 x 1000 does not.
        assert!(BmpHeader::parse(&bytes).is_ok());
        assert_eq!(
            SourceImage::from_bytes(&bytes, false).unwrap_err(),
            BmpError::InvalidImageSize {
                width: 1,
                height: 1000,
                file_size: 2000
            }
        );
    }

    #[test]
    fn short_palette_only_matters_when_requested() {
        let mut bytes = header(4, 4, 8, 0);
        bytes[10..14].copy_from_slice(&60u32.to_le_bytes());
        bytes.resize(60 + 16, 3);

        assert_eq!(
            SourceImage::from_bytes(&bytes, true).unwrap_err(),
            BmpError::TruncatedData {
                section: "palette",
                needed: 54 + PALETTE_SIZE as u64,
                available: 76
            }
        );

        let source = SourceImage::from_bytes(&bytes, false).unwrap();
        assert!(source.palette().is_empty());
        assert!(source.display_rows().all(|row| row == [3, 3, 3, 3]));
    }

    #[test]
    fn skipping_the_palette_leaves_it_empty() {
        let mut bytes = header(4, 2, 8, 0);
        bytes.resize(1078 + 8, 7);
        let source = SourceImage::from_bytes(&bytes, false).unwrap();
        assert!(source.palette().is_empty());
        assert_eq!(source.display_rows().count(), 2);
    }

    #[test]
    fn display_rows_flip_bottom_up_storage() {
        let mut bytes = header(3, 2, 8, 0);
        bytes.resize(1078, 0);
        // Stored bottom row first, each row padded to 4 bytes.
        bytes.extend_from_slice(&[4, 5, 6, 0xee, 1, 2, 3, 0xee]);
        let source = SourceImage::from_bytes(&bytes, true).unwrap();
        let rows: Vec<&[u8]> = source.display_rows().collect();
        assert_eq!(rows, vec![&[1u8, 2, 3][..], &[4u8, 5, 6][..]]);
        assert_eq!(source.palette().len(), PALETTE_ENTRIES);
    }
}

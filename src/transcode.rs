//! Conversion of BMP palettes and pixel rows into the raw Next formats.

use log::debug;

use crate::options::RepackMode;
use crate::reader::{BmpPaletteEntry, SourceImage};

/// Scale an 8-bit color channel down to 3 bits, rounding to the nearest step.
pub fn channel_to_3bit(c8: u8) -> u8 {
    (f64::from(c8) * 7.0 / 255.0).round() as u8
}

/// Scale a 3-bit color channel back up to 8 bits.
pub fn channel_to_8bit(c3: u8) -> u8 {
    (f64::from(c3 & 0x07) * 255.0 / 7.0).round() as u8
}

/// A 9-bit RGB333 color, laid out as `RRRGGGBBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb333(u16);

impl Rgb333 {
    pub fn new(r3: u8, g3: u8, b3: u8) -> Self {
        Self((u16::from(r3 & 0x07) << 6) | (u16::from(g3 & 0x07) << 3) | u16::from(b3 & 0x07))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    /// The top 8 bits, i.e. RGB333 without the lowest blue bit.
    pub fn rgb332(self) -> u8 {
        (self.0 >> 1) as u8
    }

    /// The lowest blue bit dropped by [`Rgb333::rgb332`].
    pub fn blue_lsb(self) -> u8 {
        (self.0 & 0x01) as u8
    }

    pub fn channels(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 6) & 0x07) as u8,
            ((self.0 >> 3) & 0x07) as u8,
            (self.0 & 0x07) as u8,
        )
    }

    pub fn to_rgb888(self) -> (u8, u8, u8) {
        let (r, g, b) = self.channels();
        (channel_to_8bit(r), channel_to_8bit(g), channel_to_8bit(b))
    }
}

impl From<BmpPaletteEntry> for Rgb333 {
    fn from(entry: BmpPaletteEntry) -> Self {
        Rgb333::new(
            channel_to_3bit(entry.red),
            channel_to_3bit(entry.green),
            channel_to_3bit(entry.blue),
        )
    }
}

/// A converted palette: one (RGB332, blue LSB) byte pair per color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPalette {
    colors: Vec<Rgb333>,
}

impl RawPalette {
    /// Convert the first `count` entries of a BMP color table.
    pub fn from_entries(entries: &[BmpPaletteEntry], count: usize) -> Self {
        let colors = entries.iter().take(count).copied().map(Rgb333::from).collect();
        Self { colors }
    }

    pub fn colors(&self) -> &[Rgb333] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The on-disk form, two bytes per color.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|c| [c.rgb332(), c.blue_lsb()])
            .collect()
    }
}

/// Repacked pixel indexes, ready to be written out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawImage {
    data: Vec<u8>,
}

impl RawImage {
    pub fn repack(source: &SourceImage<'_>, mode: RepackMode) -> Self {
        let row_width = mode.raw_row_width(source.width());
        let height = source.height() as usize;
        let mut data = vec![0u8; row_width * height];

        debug!("Repacking {} x {} pixels as {:?}", source.width(), height, mode);

        let rows = source.display_rows();
        match mode {
            RepackMode::Row8 => repack_rows_8bit(rows, &mut data, row_width),
            RepackMode::Col8 => repack_columns_8bit(rows, &mut data, height),
            RepackMode::Row4 => repack_rows_4bit(rows, &mut data, row_width),
            RepackMode::Col4 => repack_columns_4bit(rows, &mut data, height),
        }

        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Merge two palette indexes into one byte, left pixel in the high nibble.
fn pack_pair(left: u8, right: u8) -> u8 {
    ((left & 0x0F) << 4) | (right & 0x0F)
}

fn pairs(row: &[u8]) -> impl Iterator<Item = u8> + '_ {
    row.chunks(2)
        .map(|pair| pack_pair(pair[0], pair.get(1).copied().unwrap_or(0)))
}

fn repack_rows_8bit<'a>(rows: impl Iterator<Item = &'a [u8]>, out: &mut [u8], row_width: usize) {
    for (row, dst) in rows.zip(out.chunks_exact_mut(row_width)) {
        dst.copy_from_slice(row);
    }
}

fn repack_columns_8bit<'a>(rows: impl Iterator<Item = &'a [u8]>, out: &mut [u8], height: usize) {
    for (y, row) in rows.enumerate() {
        for (x, &pixel) in row.iter().enumerate() {
            out[y + x * height] = pixel;
        }
    }
}

fn repack_rows_4bit<'a>(rows: impl Iterator<Item = &'a [u8]>, out: &mut [u8], row_width: usize) {
    for (row, dst) in rows.zip(out.chunks_exact_mut(row_width)) {
        for (byte, packed) in dst.iter_mut().zip(pairs(row)) {
            *byte = packed;
        }
    }
}

fn repack_columns_4bit<'a>(rows: impl Iterator<Item = &'a [u8]>, out: &mut [u8], height: usize) {
    for (y, row) in rows.enumerate() {
        for (column, packed) in pairs(row).enumerate() {
            out[y + column * height] = packed;
        }
    }
}

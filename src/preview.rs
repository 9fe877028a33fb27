//! Palette swatch bitmaps for checking a conversion by eye.

use std::path::{Path, PathBuf};

use bmp::{Image, Pixel};
use log::info;

use crate::error::ConvertError;
use crate::transcode::RawPalette;

const BOX_COLS: u32 = 16;
const BOX_SIZE_PX: u32 = 16;
const BOX_BORDER_PX: u32 = 1;

/// Where the preview for a given raw image goes, e.g. `foo.nxi` -> `foo_PAL.BMP`.
pub fn preview_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{stem}_PAL.BMP"))
}

/// Draw each converted color as a bordered box, 16 boxes per row.
///
/// The colors are the RGB333 values scaled back up to 8 bits per channel, so
/// the swatches show what the Next will display rather than the source colors.
pub fn palette_to_bitmap(palette: &RawPalette) -> Image {
    let count = palette.len() as u32;
    let box_rows = count.div_ceil(BOX_COLS).max(1);

    let width = BOX_COLS * (BOX_SIZE_PX + BOX_BORDER_PX) + BOX_BORDER_PX;
    let height = box_rows * (BOX_SIZE_PX + BOX_BORDER_PX) + BOX_BORDER_PX;

    // A fresh image is all black, which doubles as the border color.
    let mut img = Image::new(width, height);

    for (i, color) in palette.colors().iter().enumerate() {
        let i = i as u32;
        let xmin = BOX_BORDER_PX * (i % BOX_COLS + 1) + BOX_SIZE_PX * (i % BOX_COLS);
        let ymin = BOX_BORDER_PX * (i / BOX_COLS + 1) + BOX_SIZE_PX * (i / BOX_COLS);
        let (r, g, b) = color.to_rgb888();
        draw_box(&mut img, xmin, ymin, Pixel::new(r, g, b));
    }

    img
}

fn draw_box(img: &mut Image, xmin: u32, ymin: u32, color: Pixel) {
    for y in ymin..ymin + BOX_SIZE_PX {
        for x in xmin..xmin + BOX_SIZE_PX {
            img.set_pixel(x, y, color);
        }
    }
}

pub fn save_preview(palette: &RawPalette, path: &Path) -> Result<(), ConvertError> {
    let img = palette_to_bitmap(palette);
    img.save(path)
        .map_err(|e| ConvertError::io(path, "write palette preview", e))?;
    info!("Wrote palette preview {}", path.display());
    Ok(())
}

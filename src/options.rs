use crate::error::ConvertError;

/// Where the converted palette ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PalettePlacement {
    /// Prepended to the raw image file
    #[default]
    Embedded,
    /// Written to its own `.nxp` file next to the raw image
    Separate,
    /// No palette is written, e.g. when the image already uses the standard palette
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    /// One pixel per byte, 256 colors
    #[default]
    Eight,
    /// Two horizontally adjacent pixels per byte, 16 colors
    Four,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Rows of pixels from top to bottom
    #[default]
    RowMajor,
    /// Columns of pixels from left to right
    ColumnMajor,
}

/// Which option surface the tool exposes.
///
/// The legacy surface is the older 8-bit, row-major only converter. It shares
/// the whole pipeline and only narrows which options are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolVariant {
    #[default]
    Full,
    Legacy,
}

/// The four supported pixel layouts, one per (bit depth, layout) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepackMode {
    /// 256 x 192 layer 2 and 8-bit sprite sheets
    Row8,
    /// 320 x 256 layer 2
    Col8,
    /// 4-bit sprite sheets
    Row4,
    /// 640 x 256 layer 2
    Col4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionOptions {
    pub palette: PalettePlacement,
    pub bit_depth: BitDepth,
    pub layout: Layout,
}

impl ConversionOptions {
    pub fn new(palette: PalettePlacement, bit_depth: BitDepth, layout: Layout) -> Self {
        Self {
            palette,
            bit_depth,
            layout,
        }
    }

    /// Options accepted by the legacy converter, which only knows about palette placement.
    pub fn legacy(palette: PalettePlacement) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    /// Reject option combinations the given tool variant doesn't offer.
    pub fn check_variant(&self, variant: ToolVariant) -> Result<(), ConvertError> {
        if variant == ToolVariant::Legacy {
            if self.bit_depth != BitDepth::Eight {
                return Err(ConvertError::Argument(
                    "4-bit output is not available in legacy mode".into(),
                ));
            }
            if self.layout != Layout::RowMajor {
                return Err(ConvertError::Argument(
                    "column layout is not available in legacy mode".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn repack_mode(&self) -> RepackMode {
        match (self.bit_depth, self.layout) {
            (BitDepth::Eight, Layout::RowMajor) => RepackMode::Row8,
            (BitDepth::Eight, Layout::ColumnMajor) => RepackMode::Col8,
            (BitDepth::Four, Layout::RowMajor) => RepackMode::Row4,
            (BitDepth::Four, Layout::ColumnMajor) => RepackMode::Col4,
        }
    }

    /// Number of palette entries converted and written.
    pub fn palette_colors(&self) -> usize {
        match self.bit_depth {
            BitDepth::Eight => 256,
            BitDepth::Four => 16,
        }
    }

    pub fn wants_palette(&self) -> bool {
        self.palette != PalettePlacement::None
    }
}

impl RepackMode {
    /// Bytes per output row for an image `width` pixels wide.
    pub fn raw_row_width(self, width: u32) -> usize {
        let width = width as usize;
        match self {
            RepackMode::Row8 | RepackMode::Col8 => width,
            RepackMode::Row4 | RepackMode::Col4 => (width + width % 2) / 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let options = ConversionOptions::default();
        assert_eq!(options.palette, PalettePlacement::Embedded);
        assert_eq!(options.repack_mode(), RepackMode::Row8);
        assert_eq!(options.palette_colors(), 256);
    }

    #[test]
    fn repack_mode_covers_every_combination() {
        let four_cols = ConversionOptions::new(PalettePlacement::None, BitDepth::Four, Layout::ColumnMajor);
        assert_eq!(four_cols.repack_mode(), RepackMode::Col4);
        assert_eq!(four_cols.palette_colors(), 16);
        assert!(!four_cols.wants_palette());

        let eight_cols = ConversionOptions::new(PalettePlacement::Separate, BitDepth::Eight, Layout::ColumnMajor);
        assert_eq!(eight_cols.repack_mode(), RepackMode::Col8);

        let four_rows = ConversionOptions::new(PalettePlacement::Embedded, BitDepth::Four, Layout::RowMajor);
        assert_eq!(four_rows.repack_mode(), RepackMode::Row4);
    }

    #[test]
    fn odd_widths_round_up_in_4bit_modes() {
        assert_eq!(RepackMode::Row4.raw_row_width(5), 3);
        assert_eq!(RepackMode::Col4.raw_row_width(6), 3);
        assert_eq!(RepackMode::Row8.raw_row_width(5), 5);
    }

    #[test]
    fn legacy_variant_restricts_options() {
        let legacy = ConversionOptions::legacy(PalettePlacement::Separate);
        assert!(legacy.check_variant(ToolVariant::Legacy).is_ok());

        let four = ConversionOptions::new(PalettePlacement::Embedded, BitDepth::Four, Layout::RowMajor);
        assert!(matches!(
            four.check_variant(ToolVariant::Legacy),
            Err(ConvertError::Argument(_))
        ));
        assert!(four.check_variant(ToolVariant::Full).is_ok());

        let cols = ConversionOptions::new(PalettePlacement::Embedded, BitDepth::Eight, Layout::ColumnMajor);
        assert!(cols.check_variant(ToolVariant::Legacy).is_err());
    }
}

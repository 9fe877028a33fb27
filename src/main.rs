use std::path::PathBuf;
use std::process::exit;

use clap::{ArgAction, Parser, ValueEnum};
use log::{Level, error, info, warn};

use nxiconvert::preview::{preview_path, save_preview};
use nxiconvert::{
    BitDepth, ConversionOptions, ConvertError, Layout, OutputPaths, PalettePlacement, ToolVariant,
    convert_file,
};

/// Convert an uncompressed 8-bit BMP file to a raw image file for ZX Spectrum Next.
///
/// The RGB888 colors in the BMP palette are converted to RGB333 colors, stored as
/// an RGB332 byte followed by a byte with the lowest blue bit.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the uncompressed 8-bit .BMP file to convert.
    input: PathBuf,

    /// Path of the raw image file. Defaults to the BMP path with the extension ".nxi".
    output: Option<PathBuf>,

    /// Where to put the raw palette. A separate palette gets the raw image path
    /// with the extension ".nxp".
    #[arg(short, long, value_enum, default_value_t = PaletteArg::Embedded)]
    palette: PaletteArg,

    /// Use 4 bits per pixel (16 colors), two horizontally adjacent pixels per byte.
    /// Default is 8 bits per pixel (256 colors).
    #[arg(long = "four-bit", alias = "4bit", default_value_t = false)]
    four_bit: bool,

    /// Lay the raw image out in columns from left to right instead of rows from top to bottom.
    #[arg(short, long, default_value_t = false)]
    columns: bool,

    /// Only allow the options of the legacy 8-bit, row based converter.
    #[arg(long, default_value_t = false)]
    legacy: bool,

    /// Turns on debug mode, which also writes <output>_PAL.BMP
    /// showing the converted palette colors.
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// More log output, repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, default_value_t = false, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaletteArg {
    /// The raw palette is prepended to the raw image file
    Embedded,
    /// The raw palette is written to a separate .nxp file
    Separate,
    /// No raw palette is created
    None,
}

impl From<PaletteArg> for PalettePlacement {
    fn from(arg: PaletteArg) -> Self {
        match arg {
            PaletteArg::Embedded => PalettePlacement::Embedded,
            PaletteArg::Separate => PalettePlacement::Separate,
            PaletteArg::None => PalettePlacement::None,
        }
    }
}

impl Args {
    fn log_level(&self) -> Level {
        if self.quiet {
            return Level::Error;
        }
        match self.verbose {
            0 => Level::Warn,
            1 => Level::Info,
            2 => Level::Debug,
            _ => Level::Trace,
        }
    }

    fn options(&self) -> ConversionOptions {
        ConversionOptions::new(
            self.palette.into(),
            if self.four_bit { BitDepth::Four } else { BitDepth::Eight },
            if self.columns { Layout::ColumnMajor } else { Layout::RowMajor },
        )
    }

    fn variant(&self) -> ToolVariant {
        if self.legacy { ToolVariant::Legacy } else { ToolVariant::Full }
    }
}

fn run(args: &Args) -> Result<(), ConvertError> {
    let options = args.options();
    options.check_variant(args.variant())?;

    let paths = OutputPaths::resolve(&args.input, args.output.as_deref(), options.palette)?;
    let report = convert_file(&paths, &options)?;

    if args.debug {
        match &report.palette {
            Some(palette) => save_preview(palette, &preview_path(&paths.image))?,
            None => warn!("No palette was converted, skipping the palette preview"),
        }
    }

    info!("Done!");
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = simple_logger::init_with_level(args.log_level()) {
        eprintln!("Could not initialize logging: {e}");
    }

    if let Err(err) = run(&args) {
        error!("{err}");
        exit(1);
    }
}

//! Output file naming, the conversion pipeline and the file sinks.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::ConvertError;
use crate::options::{ConversionOptions, PalettePlacement};
use crate::reader::SourceImage;
use crate::transcode::{RawImage, RawPalette};

pub const IMAGE_EXTENSION: &str = "nxi";
pub const PALETTE_EXTENSION: &str = "nxp";

/// `foo.bmp` -> `foo.nxi`
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(IMAGE_EXTENSION)
}

/// `foo.nxi` -> `foo.nxp`
pub fn palette_path(output: &Path) -> PathBuf {
    output.with_extension(PALETTE_EXTENSION)
}

/// The files one conversion run reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub input: PathBuf,
    pub image: PathBuf,
    /// Only set for [`PalettePlacement::Separate`]
    pub palette: Option<PathBuf>,
}

impl OutputPaths {
    pub fn resolve(
        input: &Path,
        output: Option<&Path>,
        placement: PalettePlacement,
    ) -> Result<Self, ConvertError> {
        let image = match output {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input),
        };
        if image == input {
            return Err(ConvertError::Argument(format!(
                "BMP file and raw image file cannot have the same name ({})",
                input.display()
            )));
        }

        let palette = (placement == PalettePlacement::Separate).then(|| palette_path(&image));
        if palette.as_deref() == Some(input) {
            return Err(ConvertError::Argument(format!(
                "BMP file and raw palette file cannot have the same name ({})",
                input.display()
            )));
        }

        Ok(Self {
            input: input.to_path_buf(),
            image,
            palette,
        })
    }
}

/// The in-memory result of converting one BMP.
#[derive(Debug, Clone)]
pub struct Converted {
    pub width: u32,
    pub height: u32,
    pub palette: Option<RawPalette>,
    pub image: RawImage,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub paths: OutputPaths,
    pub width: u32,
    pub height: u32,
    pub palette: Option<RawPalette>,
    pub palette_bytes: usize,
    pub image_bytes: usize,
}

/// Validate a BMP held in memory and convert it.
///
/// Errors are reported against `path`, which is only used for messages.
pub fn convert_bytes(
    bytes: &[u8],
    path: &Path,
    options: &ConversionOptions,
) -> Result<Converted, ConvertError> {
    let source = SourceImage::from_bytes(bytes, options.wants_palette()).map_err(|source| {
        ConvertError::Bmp {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let palette = options
        .wants_palette()
        .then(|| RawPalette::from_entries(source.palette(), options.palette_colors()));
    let image = RawImage::repack(&source, options.repack_mode());

    Ok(Converted {
        width: source.width(),
        height: source.height(),
        palette,
        image,
    })
}

/// Write the converted data according to the palette placement.
///
/// Each file is assembled in memory and written in one go. If a write fails,
/// the files this call managed to create are removed again. A file that
/// couldn't be opened is left alone.
pub fn write_outputs(
    paths: &OutputPaths,
    converted: &Converted,
    placement: PalettePlacement,
) -> Result<(usize, usize), ConvertError> {
    let palette_bytes = converted
        .palette
        .as_ref()
        .map(RawPalette::to_bytes)
        .unwrap_or_default();
    let image_bytes = converted.image.as_bytes();

    let mut created: Vec<&Path> = Vec::new();
    if let Err(err) = write_files(paths, &palette_bytes, image_bytes, placement, &mut created) {
        for path in created {
            if let Err(e) = fs::remove_file(path) {
                warn!("Could not remove incomplete output {}: {}", path.display(), e);
            }
        }
        return Err(err);
    }

    Ok((palette_bytes.len(), image_bytes.len()))
}

fn write_files<'p>(
    paths: &'p OutputPaths,
    palette_bytes: &[u8],
    image_bytes: &[u8],
    placement: PalettePlacement,
    created: &mut Vec<&'p Path>,
) -> Result<(), ConvertError> {
    match placement {
        PalettePlacement::Separate => {
            let palette_file = paths.palette.as_deref().ok_or_else(|| {
                ConvertError::Argument(format!(
                    "no raw palette file name was resolved for {}",
                    paths.image.display()
                ))
            })?;
            write_file(palette_file, palette_bytes, "write raw palette", created)?;
            write_file(&paths.image, image_bytes, "write raw image", created)
        }
        PalettePlacement::Embedded => {
            let mut file = Vec::with_capacity(palette_bytes.len() + image_bytes.len());
            file.extend_from_slice(palette_bytes);
            file.extend_from_slice(image_bytes);
            write_file(&paths.image, &file, "write raw image", created)
        }
        PalettePlacement::None => write_file(&paths.image, image_bytes, "write raw image", created),
    }
}

/// Create `path` and fill it, recording it in `created` once it has been opened.
fn write_file<'p>(
    path: &'p Path,
    contents: &[u8],
    action: &'static str,
    created: &mut Vec<&'p Path>,
) -> Result<(), ConvertError> {
    let mut file = File::create(path).map_err(|e| ConvertError::io(path, action, e))?;
    created.push(path);
    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(|e| ConvertError::io(path, action, e))
}

/// Convert the BMP at `paths.input`, writing the raw image and palette files.
pub fn convert_file(
    paths: &OutputPaths,
    options: &ConversionOptions,
) -> Result<ConversionReport, ConvertError> {
    debug!("Converting {} with {:?}", paths.input.display(), options);

    let bytes =
        fs::read(&paths.input).map_err(|e| ConvertError::io(&paths.input, "read BMP", e))?;
    let converted = convert_bytes(&bytes, &paths.input, options)?;
    let (palette_bytes, image_bytes) = write_outputs(paths, &converted, options.palette)?;

    if let Some(palette_file) = &paths.palette {
        info!("Wrote raw palette {} ({} bytes)", palette_file.display(), palette_bytes);
    }
    info!(
        "Wrote raw image {} ({} x {}, {} bytes)",
        paths.image.display(),
        converted.width,
        converted.height,
        if options.palette == PalettePlacement::Embedded {
            palette_bytes + image_bytes
        } else {
            image_bytes
        }
    );

    Ok(ConversionReport {
        paths: paths.clone(),
        width: converted.width,
        height: converted.height,
        palette: converted.palette,
        palette_bytes,
        image_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names() {
        assert_eq!(default_output_path(Path::new("foo.bmp")), PathBuf::from("foo.nxi"));
        assert_eq!(default_output_path(Path::new("dir/foo")), PathBuf::from("dir/foo.nxi"));
        assert_eq!(palette_path(Path::new("foo.nxi")), PathBuf::from("foo.nxp"));
    }

    #[test]
    fn resolve_derives_palette_only_when_separate() {
        let paths = OutputPaths::resolve(Path::new("foo.bmp"), None, PalettePlacement::Separate).unwrap();
        assert_eq!(paths.image, PathBuf::from("foo.nxi"));
        assert_eq!(paths.palette, Some(PathBuf::from("foo.nxp")));

        let paths = OutputPaths::resolve(
            Path::new("foo.bmp"),
            Some(Path::new("out/bar.raw")),
            PalettePlacement::Embedded,
        )
        .unwrap();
        assert_eq!(paths.image, PathBuf::from("out/bar.raw"));
        assert_eq!(paths.palette, None);
    }

    #[test]
    fn output_may_not_overwrite_input() {
        let err = OutputPaths::resolve(Path::new("foo.nxi"), None, PalettePlacement::Embedded);
        assert!(matches!(err, Err(ConvertError::Argument(_))));

        let err = OutputPaths::resolve(
            Path::new("foo.bmp"),
            Some(Path::new("foo.bmp")),
            PalettePlacement::None,
        );
        assert!(matches!(err, Err(ConvertError::Argument(_))));

        let err = OutputPaths::resolve(
            Path::new("foo.nxp"),
            Some(Path::new("foo.raw")),
            PalettePlacement::Separate,
        );
        assert!(matches!(err, Err(ConvertError::Argument(_))));
    }
}

//! Raster persistence.

use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::error::ExtractError;

/// Persists a decoded raster to a file.
pub trait RasterWriter {
    /// Write `raster` to `path`, encoded as `file_type` (an extension such
    /// as `"png"` or `"jpg"`).
    fn write(&self, path: &Path, raster: &DynamicImage, file_type: &str)
    -> Result<(), ExtractError>;
}

impl<W: RasterWriter + ?Sized> RasterWriter for &W {
    fn write(
        &self,
        path: &Path,
        raster: &DynamicImage,
        file_type: &str,
    ) -> Result<(), ExtractError> {
        (**self).write(path, raster, file_type)
    }
}

/// Default [`RasterWriter`] backed by the `image` crate encoders.
///
/// Existing files are replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

/// Resolve a file type string to an encoder format.
pub fn image_format(file_type: &str) -> Result<ImageFormat, ExtractError> {
    ImageFormat::from_extension(file_type.trim_start_matches('.'))
        .ok_or_else(|| ExtractError::UnsupportedFileType(file_type.to_string()))
}

fn supports_sixteen_bit(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Tiff | ImageFormat::Pnm)
}

impl RasterWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        raster: &DynamicImage,
        file_type: &str,
    ) -> Result<(), ExtractError> {
        let format = image_format(file_type)?;

        let narrowed = match raster {
            DynamicImage::ImageLuma16(_) if !supports_sixteen_bit(format) => {
                Some(DynamicImage::ImageLuma8(raster.to_luma8()))
            }
            DynamicImage::ImageRgb16(_) if !supports_sixteen_bit(format) => {
                Some(DynamicImage::ImageRgb8(raster.to_rgb8()))
            }
            _ => None,
        };

        narrowed
            .as_ref()
            .unwrap_or(raster)
            .save_with_format(path, format)
            .map_err(|error| ExtractError::WriteError {
                path: path.to_path_buf(),
                reason: error.to_string(),
            })
    }
}

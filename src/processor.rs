//! Frame decoding.
//!
//! [`FrameDecoder`] is the capability the saver depends on: turn a
//! [`Frame`] into a mono or color raster. [`ImageProcessor`] is the real
//! implementation, handling the common ROS encodings, Bayer sensor output,
//! and packed YUV.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

use crate::{
    conversion::{packed_rows, sample_to_u8, u16_at, yuv_to_rgb},
    debayer::demosaic_bilinear,
    encoding::{ChannelOrder, DecodeMode, PixelLayout, SampleDepth},
    error::ExtractError,
    frame::Frame,
};

/// Decodes a frame into a raster of the requested shape.
pub trait FrameDecoder {
    /// Produce a single-channel raster for [`DecodeMode::Mono`] or an RGB
    /// raster for [`DecodeMode::Color`].
    fn decode(&self, frame: &Frame, mode: DecodeMode) -> Result<DynamicImage, ExtractError>;
}

impl<D: FrameDecoder + ?Sized> FrameDecoder for &D {
    fn decode(&self, frame: &Frame, mode: DecodeMode) -> Result<DynamicImage, ExtractError> {
        (**self).decode(frame, mode)
    }
}

/// Default [`FrameDecoder`].
///
/// Mono output keeps 8-bit and unsigned 16-bit samples as they are and
/// saturates every other single-channel depth into 8 bits. Color output is
/// always 8-bit RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for ImageProcessor {
    fn decode(&self, frame: &Frame, mode: DecodeMode) -> Result<DynamicImage, ExtractError> {
        let layout = PixelLayout::parse(&frame.encoding)
            .ok_or_else(|| ExtractError::UnsupportedEncoding(frame.encoding.clone()))?;
        let packed = packed_rows(frame, layout.row_bytes(frame.width))?;

        log::trace!(
            "Decoding {}x{} `{}` frame as {mode}",
            frame.width,
            frame.height,
            frame.encoding
        );

        let image = match (mode, layout) {
            (DecodeMode::Mono, PixelLayout::Gray(depth)) => gray_to_mono(frame, depth, &packed)?,
            (DecodeMode::Mono, _) => {
                DynamicImage::ImageRgb8(to_rgb8(frame, layout, &packed)?).grayscale()
            }
            (DecodeMode::Color, _) => DynamicImage::ImageRgb8(to_rgb8(frame, layout, &packed)?),
        };
        Ok(image)
    }
}

fn buffer_error() -> ExtractError {
    ExtractError::DecodeError("pixel buffer does not match image dimensions".to_string())
}

fn gray_to_mono(
    frame: &Frame,
    depth: SampleDepth,
    packed: &[u8],
) -> Result<DynamicImage, ExtractError> {
    let (width, height) = (frame.width, frame.height);
    match depth {
        SampleDepth::U8 => GrayImage::from_raw(width, height, packed.to_vec())
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(buffer_error),
        SampleDepth::U16 => {
            let samples = packed
                .chunks_exact(2)
                .map(|bytes| u16_at(bytes, frame.is_bigendian))
                .collect();
            ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, samples)
                .map(DynamicImage::ImageLuma16)
                .ok_or_else(buffer_error)
        }
        other => {
            let samples = packed
                .chunks_exact(other.bytes())
                .map(|bytes| sample_to_u8(bytes, other, frame.is_bigendian))
                .collect();
            GrayImage::from_raw(width, height, samples)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(buffer_error)
        }
    }
}

fn to_rgb8(frame: &Frame, layout: PixelLayout, packed: &[u8]) -> Result<RgbImage, ExtractError> {
    let (width, height) = (frame.width as usize, frame.height as usize);
    let big_endian = frame.is_bigendian;

    let rgb = match layout {
        PixelLayout::Gray(depth) => packed
            .chunks_exact(depth.bytes())
            .flat_map(|bytes| [sample_to_u8(bytes, depth, big_endian); 3])
            .collect(),
        PixelLayout::Color { depth, order, .. } => {
            let sample = depth.bytes();
            let mut rgb = Vec::with_capacity(width * height * 3);
            for pixel in packed.chunks_exact(layout.channels() * sample) {
                let channel = |index: usize| {
                    sample_to_u8(&pixel[index * sample..], depth, big_endian)
                };
                match order {
                    ChannelOrder::Rgb => rgb.extend([channel(0), channel(1), channel(2)]),
                    ChannelOrder::Bgr => rgb.extend([channel(2), channel(1), channel(0)]),
                }
            }
            rgb
        }
        PixelLayout::Bayer { pattern, depth } => {
            let (samples, shift): (Vec<u16>, u32) = match depth {
                SampleDepth::U16 => (
                    packed
                        .chunks_exact(2)
                        .map(|bytes| u16_at(bytes, big_endian))
                        .collect(),
                    8,
                ),
                _ => (packed.iter().map(|&value| value as u16).collect(), 0),
            };
            return Ok(demosaic_bilinear(&samples, width, height, pattern, shift));
        }
        PixelLayout::Yuv422 => {
            let mut image = RgbImage::new(frame.width, frame.height);
            for (y, row) in packed.chunks_exact(width * 2).enumerate() {
                for x in 0..width {
                    let pair = x & !1;
                    let u = row[pair * 2];
                    let v = row.get(pair * 2 + 2).copied().unwrap_or(128);
                    let luma = row[x * 2 + 1];
                    image.put_pixel(x as u32, y as u32, Rgb(yuv_to_rgb(luma, u, v)));
                }
            }
            return Ok(image);
        }
    };

    RgbImage::from_raw(frame.width, frame.height, rgb).ok_or_else(buffer_error)
}

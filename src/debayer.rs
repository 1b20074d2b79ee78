//! Bilinear demosaicing of Bayer-pattern sensor data.

use image::{Rgb, RgbImage};

use crate::encoding::BayerPattern;

/// Interpolate a full RGB image from single-channel CFA samples.
///
/// Each output channel is the sensor value where the filter matches, and the
/// rounded mean of the matching filters in the surrounding 3x3 block
/// elsewhere. Samples are shifted right by `shift` bits before narrowing to
/// 8 bits (`8` for 16-bit sensors, `0` for 8-bit ones).
pub(crate) fn demosaic_bilinear(
    samples: &[u16],
    width: usize,
    height: usize,
    pattern: BayerPattern,
    shift: u32,
) -> RgbImage {
    let mut image = RgbImage::new(width as u32, height as u32);
    if width == 0 || height == 0 {
        return image;
    }

    for y in 0..height {
        let rows = y.saturating_sub(1)..=(y + 1).min(height - 1);
        for x in 0..width {
            let columns = x.saturating_sub(1)..=(x + 1).min(width - 1);
            let mut sums = [0u32; 3];
            let mut counts = [0u32; 3];
            for ny in rows.clone() {
                for nx in columns.clone() {
                    let channel = pattern.channel_at(nx, ny);
                    sums[channel] += samples[ny * width + nx] as u32;
                    counts[channel] += 1;
                }
            }

            let own = pattern.channel_at(x, y);
            let mut pixel = [0u8; 3];
            for (channel, value) in pixel.iter_mut().enumerate() {
                let sample = if channel == own {
                    samples[y * width + x] as u32
                } else if counts[channel] > 0 {
                    (sums[channel] + counts[channel] / 2) / counts[channel]
                } else {
                    0
                };
                *value = (sample >> shift).min(255) as u8;
            }
            image.put_pixel(x as u32, y as u32, Rgb(pixel));
        }
    }

    image
}

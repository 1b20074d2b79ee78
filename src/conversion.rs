//! Internal pixel conversion helpers.
//!
//! Sample decoding for the fixed-width numeric types a frame can carry,
//! stride stripping, saturating narrowing, and YUV to RGB conversion.

use crate::{encoding::SampleDepth, error::ExtractError, frame::Frame};

/// Copy the pixel rows of `frame` into a tightly-packed buffer.
///
/// Frames may carry per-row padding (`step > row_bytes`). This strips it
/// after checking that the payload actually covers `step * height` bytes.
pub(crate) fn packed_rows(frame: &Frame, row_bytes: usize) -> Result<Vec<u8>, ExtractError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(ExtractError::DecodeError(format!(
            "image has zero size ({}x{})",
            frame.width, frame.height
        )));
    }

    let step = frame.step as usize;
    let height = frame.height as usize;
    if step < row_bytes {
        return Err(ExtractError::DecodeError(format!(
            "step {step} is smaller than a {row_bytes}-byte row of `{}`",
            frame.encoding
        )));
    }

    let required = step.checked_mul(height).ok_or_else(|| {
        ExtractError::DecodeError(format!("image geometry overflows ({step}x{height})"))
    })?;
    if frame.data.len() < required {
        return Err(ExtractError::DecodeError(format!(
            "payload holds {} bytes, expected at least {required}",
            frame.data.len()
        )));
    }

    if step == row_bytes {
        return Ok(frame.data[..required].to_vec());
    }

    let mut buffer = Vec::with_capacity(row_bytes * height);
    for row in frame.data.chunks_exact(step).take(height) {
        buffer.extend_from_slice(&row[..row_bytes]);
    }
    Ok(buffer)
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Read one unsigned 16-bit sample.
pub(crate) fn u16_at(bytes: &[u8], big_endian: bool) -> u16 {
    if big_endian {
        u16::from_be_bytes(array(bytes))
    } else {
        u16::from_le_bytes(array(bytes))
    }
}

/// Read one sample of any depth as `f64`.
pub(crate) fn sample_at(bytes: &[u8], depth: SampleDepth, big_endian: bool) -> f64 {
    match depth {
        SampleDepth::U8 => bytes[0] as f64,
        SampleDepth::I8 => bytes[0] as i8 as f64,
        SampleDepth::U16 => u16_at(bytes, big_endian) as f64,
        SampleDepth::I16 => {
            if big_endian {
                i16::from_be_bytes(array(bytes)) as f64
            } else {
                i16::from_le_bytes(array(bytes)) as f64
            }
        }
        SampleDepth::I32 => {
            if big_endian {
                i32::from_be_bytes(array(bytes)) as f64
            } else {
                i32::from_le_bytes(array(bytes)) as f64
            }
        }
        SampleDepth::F32 => {
            if big_endian {
                f32::from_be_bytes(array(bytes)) as f64
            } else {
                f32::from_le_bytes(array(bytes)) as f64
            }
        }
        SampleDepth::F64 => {
            if big_endian {
                f64::from_be_bytes(array(bytes))
            } else {
                f64::from_le_bytes(array(bytes))
            }
        }
    }
}

/// Round and clamp into `0..=255`. NaN maps to 0.
pub(crate) fn saturate_u8(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}

/// Narrow one sample to 8 bits.
///
/// Unsigned 16-bit samples keep their high byte; every other depth
/// saturates.
pub(crate) fn sample_to_u8(bytes: &[u8], depth: SampleDepth, big_endian: bool) -> u8 {
    match depth {
        SampleDepth::U8 => bytes[0],
        SampleDepth::U16 => (u16_at(bytes, big_endian) >> 8) as u8,
        other => saturate_u8(sample_at(bytes, other, big_endian)),
    }
}

/// BT.601 YCbCr to RGB.
pub(crate) fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f64;
    let u = u as f64 - 128.0;
    let v = v as f64 - 128.0;
    [
        saturate_u8(y + 1.402 * v),
        saturate_u8(y - 0.344_136 * u - 0.714_136 * v),
        saturate_u8(y + 1.772 * u),
    ]
}

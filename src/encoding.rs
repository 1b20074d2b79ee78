//! Image encoding tags and decode-mode classification.
//!
//! ROS image messages describe their pixel layout with a free-form string
//! such as `"mono8"`, `"bgr8"`, `"bayer_rggb8"`, or an OpenCV-style tag like
//! `"16UC1"`. This module maps those tags to a [`PixelLayout`] the decoder
//! can work with, and decides which [`DecodeMode`] a frame is saved in.

use std::fmt::{Display, Formatter, Result as FmtResult};

pub const MONO8: &str = "mono8";
pub const MONO16: &str = "mono16";
pub const RGB8: &str = "rgb8";
pub const BGR8: &str = "bgr8";
pub const RGBA8: &str = "rgba8";
pub const BGRA8: &str = "bgra8";
pub const RGB16: &str = "rgb16";
pub const BGR16: &str = "bgr16";
pub const RGBA16: &str = "rgba16";
pub const BGRA16: &str = "bgra16";
pub const YUV422: &str = "yuv422";
pub const TYPE_8UC1: &str = "8UC1";
pub const TYPE_8SC1: &str = "8SC1";
pub const TYPE_16UC1: &str = "16UC1";
pub const TYPE_16SC1: &str = "16SC1";
pub const TYPE_32SC1: &str = "32SC1";
pub const TYPE_32FC1: &str = "32FC1";
pub const TYPE_64FC1: &str = "64FC1";

/// Encodings that are saved as single-channel images.
pub const MONO_ENCODINGS: [&str; 9] = [
    MONO8, MONO16, TYPE_32FC1, TYPE_32SC1, TYPE_8UC1, TYPE_8SC1, TYPE_16UC1, TYPE_16SC1,
    TYPE_64FC1,
];

/// Target raster shape requested from a [`FrameDecoder`](crate::FrameDecoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    /// Single-channel output.
    Mono,
    /// Three-channel RGB output.
    Color,
}

impl DecodeMode {
    /// Pick the decode mode for an encoding tag.
    ///
    /// Tags in [`MONO_ENCODINGS`] are decoded as [`DecodeMode::Mono`];
    /// anything else, including unknown tags, falls back to
    /// [`DecodeMode::Color`].
    pub fn for_encoding(encoding: &str) -> Self {
        if MONO_ENCODINGS.contains(&encoding) {
            DecodeMode::Mono
        } else {
            DecodeMode::Color
        }
    }
}

impl Display for DecodeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DecodeMode::Mono => write!(f, "mono"),
            DecodeMode::Color => write!(f, "color"),
        }
    }
}

/// Storage type of a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDepth {
    U8,
    I8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

impl SampleDepth {
    /// Size of one sample in bytes.
    pub fn bytes(self) -> usize {
        match self {
            SampleDepth::U8 | SampleDepth::I8 => 1,
            SampleDepth::U16 | SampleDepth::I16 => 2,
            SampleDepth::I32 | SampleDepth::F32 => 4,
            SampleDepth::F64 => 8,
        }
    }
}

/// Order of the channels in an interleaved color pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// Color filter array arrangement, named by the top-left 2x2 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayerPattern {
    Rggb,
    Bggr,
    Gbrg,
    Grbg,
}

impl BayerPattern {
    /// Channel index (0 = R, 1 = G, 2 = B) of the filter at `(x, y)`.
    pub fn channel_at(self, x: usize, y: usize) -> usize {
        let cell = (y & 1) * 2 + (x & 1);
        let block: [usize; 4] = match self {
            BayerPattern::Rggb => [0, 1, 1, 2],
            BayerPattern::Bggr => [2, 1, 1, 0],
            BayerPattern::Gbrg => [1, 2, 0, 1],
            BayerPattern::Grbg => [1, 0, 2, 1],
        };
        block[cell]
    }
}

/// Memory layout of a frame's pixel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// One sample per pixel.
    Gray(SampleDepth),
    /// Interleaved color samples, with an optional trailing alpha channel.
    Color {
        depth: SampleDepth,
        order: ChannelOrder,
        alpha: bool,
    },
    /// Raw sensor data behind a color filter array.
    Bayer {
        pattern: BayerPattern,
        depth: SampleDepth,
    },
    /// Packed UYVY 4:2:2.
    Yuv422,
}

impl PixelLayout {
    /// Resolve an encoding tag. Returns `None` for unknown tags.
    pub fn parse(encoding: &str) -> Option<Self> {
        let layout = match encoding {
            MONO8 => PixelLayout::Gray(SampleDepth::U8),
            MONO16 => PixelLayout::Gray(SampleDepth::U16),
            RGB8 => color(SampleDepth::U8, ChannelOrder::Rgb, false),
            BGR8 => color(SampleDepth::U8, ChannelOrder::Bgr, false),
            RGBA8 => color(SampleDepth::U8, ChannelOrder::Rgb, true),
            BGRA8 => color(SampleDepth::U8, ChannelOrder::Bgr, true),
            RGB16 => color(SampleDepth::U16, ChannelOrder::Rgb, false),
            BGR16 => color(SampleDepth::U16, ChannelOrder::Bgr, false),
            RGBA16 => color(SampleDepth::U16, ChannelOrder::Rgb, true),
            BGRA16 => color(SampleDepth::U16, ChannelOrder::Bgr, true),
            YUV422 => PixelLayout::Yuv422,
            other => return parse_bayer(other).or_else(|| parse_cv_type(other)),
        };
        Some(layout)
    }

    /// Number of interleaved samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray(_) | PixelLayout::Bayer { .. } => 1,
            PixelLayout::Color { alpha, .. } => {
                if alpha {
                    4
                } else {
                    3
                }
            }
            PixelLayout::Yuv422 => 2,
        }
    }

    /// Sample storage type.
    pub fn depth(self) -> SampleDepth {
        match self {
            PixelLayout::Gray(depth)
            | PixelLayout::Color { depth, .. }
            | PixelLayout::Bayer { depth, .. } => depth,
            PixelLayout::Yuv422 => SampleDepth::U8,
        }
    }

    /// Minimum row length in bytes for an image `width` pixels wide.
    pub fn row_bytes(self, width: u32) -> usize {
        width as usize * self.channels() * self.depth().bytes()
    }
}

fn color(depth: SampleDepth, order: ChannelOrder, alpha: bool) -> PixelLayout {
    PixelLayout::Color {
        depth,
        order,
        alpha,
    }
}

fn parse_bayer(encoding: &str) -> Option<PixelLayout> {
    let rest = encoding.strip_prefix("bayer_")?;
    let (pattern, bits) = (rest.get(..4)?, rest.get(4..)?);
    let pattern = match pattern {
        "rggb" => BayerPattern::Rggb,
        "bggr" => BayerPattern::Bggr,
        "gbrg" => BayerPattern::Gbrg,
        "grbg" => BayerPattern::Grbg,
        _ => return None,
    };
    let depth = match bits {
        "8" => SampleDepth::U8,
        "16" => SampleDepth::U16,
        _ => return None,
    };
    Some(PixelLayout::Bayer { pattern, depth })
}

/// Parse OpenCV-style tags: `{bits}{U|S|F}C{channels}`.
fn parse_cv_type(encoding: &str) -> Option<PixelLayout> {
    let (prefix, channels) = encoding.split_once('C')?;
    let channels: usize = channels.parse().ok()?;
    let depth = match prefix {
        "8U" => SampleDepth::U8,
        "8S" => SampleDepth::I8,
        "16U" => SampleDepth::U16,
        "16S" => SampleDepth::I16,
        "32S" => SampleDepth::I32,
        "32F" => SampleDepth::F32,
        "64F" => SampleDepth::F64,
        _ => return None,
    };
    match channels {
        1 => Some(PixelLayout::Gray(depth)),
        3 => Some(color(depth, ChannelOrder::Bgr, false)),
        4 => Some(color(depth, ChannelOrder::Bgr, true)),
        _ => None,
    }
}

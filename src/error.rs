//! Error types for the `bagshot` crate.
//!
//! This module defines [`ExtractError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry enough context (bag paths,
//! output paths, encoding tags) to be logged as-is by the batch driver.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `bagshot` operations.
///
/// Every public method that can fail returns `Result<T, ExtractError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The bag file could not be opened.
    #[error("Failed to open bag file at {path}: {reason}")]
    BagOpen {
        /// Path that was passed to [`crate::ImageBagProcessor::process_bag`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// A record inside an opened bag could not be read.
    #[error("Failed to read bag file at {path}: {reason}")]
    BagRead {
        /// Path of the bag being read.
        path: PathBuf,
        /// Underlying reason reported by the bag reader.
        reason: String,
    },

    /// A message payload is not a valid serialized `sensor_msgs/Image`.
    #[error("Failed to parse image message: {0}")]
    MessageParse(String),

    /// The frame uses a pixel encoding the decoder does not understand.
    #[error("Unsupported image encoding: {0}")]
    UnsupportedEncoding(String),

    /// The frame payload is inconsistent with its declared geometry.
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    /// The configured file type does not map to a known image format.
    #[error("Unsupported output file type: {0}")]
    UnsupportedFileType(String),

    /// A decoded raster could not be written to disk.
    #[error("Failed to save {path}: {reason}")]
    WriteError {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying reason the write failed.
        reason: String,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during raster conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl ExtractError {
    /// Returns `true` for failures raised while turning a frame into a raster.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            ExtractError::UnsupportedEncoding(_) | ExtractError::DecodeError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_error_names_destination() {
        let error = ExtractError::WriteError {
            path: PathBuf::from("/tmp/image1.png"),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to save /tmp/image1.png: permission denied"
        );
        assert!(!error.is_decode_failure());
    }

    #[test]
    fn decode_failures_are_classified() {
        assert!(ExtractError::UnsupportedEncoding("yuv420".into()).is_decode_failure());
        assert!(ExtractError::DecodeError("short buffer".into()).is_decode_failure());
        assert!(!ExtractError::MessageParse("truncated".into()).is_decode_failure());
    }
}

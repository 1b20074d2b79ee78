//! Frame persistence.
//!
//! [`ImageSaver`] is the consumer registered with an
//! [`ImageBagProcessor`](crate::ImageBagProcessor). Every frame it receives
//! is classified, decoded, and written to
//! `{save_dir}/{prefix}{timestamp_ns}.{file_type}`. Failures are logged and
//! confined to the frame that caused them.
//!
//! # Example
//!
//! ```no_run
//! use bagshot::{ImageBagProcessor, ImageSaver, SaverConfig};
//!
//! let mut saver = ImageSaver::new(SaverConfig::new("/tmp", "png"));
//! {
//!     let mut processor = ImageBagProcessor::new("/camera/image_raw");
//!     processor.register_callback(|frame| saver.save(frame));
//!     processor.process_bag("recording.bag")?;
//! }
//! println!("saved {} frames", saver.num_saved());
//! # Ok::<(), bagshot::ExtractError>(())
//! ```

use std::path::PathBuf;

use crate::{
    config::SaverConfig,
    encoding::DecodeMode,
    error::ExtractError,
    frame::Frame,
    processor::{FrameDecoder, ImageProcessor},
    writer::{ImageFileWriter, RasterWriter},
};

/// Decodes frames and writes them to disk, counting successful saves.
#[derive(Debug)]
pub struct ImageSaver<D = ImageProcessor, W = ImageFileWriter> {
    config: SaverConfig,
    decoder: D,
    writer: W,
    num_saved: u64,
}

impl ImageSaver {
    /// Create a saver using [`ImageProcessor`] and [`ImageFileWriter`].
    pub fn new(config: SaverConfig) -> Self {
        Self::with_backends(config, ImageProcessor, ImageFileWriter)
    }
}

impl<D: FrameDecoder, W: RasterWriter> ImageSaver<D, W> {
    /// Create a saver with a custom decoder and writer.
    pub fn with_backends(config: SaverConfig, decoder: D, writer: W) -> Self {
        Self {
            config,
            decoder,
            writer,
            num_saved: 0,
        }
    }

    pub fn config(&self) -> &SaverConfig {
        &self.config
    }

    /// Number of frames written so far.
    pub fn num_saved(&self) -> u64 {
        self.num_saved
    }

    /// Save one frame, logging any failure.
    ///
    /// Decode and write failures are reported through the `log` facade at
    /// error level and otherwise swallowed, so a bad frame never stops the
    /// surrounding batch.
    pub fn save(&mut self, frame: &Frame) {
        match self.try_save(frame) {
            Ok(_) => {}
            Err(error) if error.is_decode_failure() => {
                log::error!("Error processing image: {error}");
            }
            Err(error) => log::error!("{error}"),
        }
    }

    /// Save one frame and return the written path.
    ///
    /// The counter is only incremented when the write succeeds. A file that
    /// already exists at the destination is overwritten.
    pub fn try_save(&mut self, frame: &Frame) -> Result<PathBuf, ExtractError> {
        let mode = DecodeMode::for_encoding(&frame.encoding);
        let raster = self.decoder.decode(frame, mode)?;

        let path = self.config.output_path(frame.timestamp_ns());
        self.writer
            .write(&path, &raster, self.config.file_type())
            .map_err(|error| match error {
                ExtractError::WriteError { .. } => error,
                other => ExtractError::WriteError {
                    path: path.clone(),
                    reason: other.to_string(),
                },
            })?;

        self.num_saved += 1;
        log::debug!("Saved {} ({mode})", path.display());
        Ok(path)
    }
}

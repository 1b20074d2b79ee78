//! # bagshot
//!
//! Extract image frames from ROS 1 bag files and save each one as an image
//! file named after its capture timestamp.
//!
//! `bagshot` reads bags with the [`rosbag`](https://crates.io/crates/rosbag)
//! crate, decodes `sensor_msgs/Image` payloads (including Bayer sensor data)
//! into [`image::DynamicImage`] values, and writes them with the `image`
//! crate encoders.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bagshot::{ImageBagProcessor, ImageSaver, SaverConfig};
//!
//! let mut saver = ImageSaver::new(SaverConfig::new("/tmp", "jpg"));
//! {
//!     let mut processor = ImageBagProcessor::new("/stereo_down/left/image_raw");
//!     processor.register_callback(|frame| saver.save(frame));
//!     for bag in ["bag1.bag", "bag2.bag"] {
//!         processor.process_bag(bag)?;
//!     }
//! }
//! // Files are named /tmp/image<timestamp_ns>.jpg
//! println!("{} frames saved", saver.num_saved());
//! # Ok::<(), bagshot::ExtractError>(())
//! ```
//!
//! ## Decoding
//!
//! Frames whose encoding is one of [`encoding::MONO_ENCODINGS`] are saved as
//! single-channel images; everything else is converted to 8-bit RGB. The
//! decode and write steps sit behind the [`FrameDecoder`] and
//! [`RasterWriter`] traits so either can be replaced.

pub mod bag;
pub mod config;
mod conversion;
mod debayer;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod processor;
pub mod progress;
pub mod saver;
pub mod writer;

pub use bag::{BagMessage, BagStats, IMAGE_MESSAGE_TYPE, ImageBagProcessor};
pub use config::{DEFAULT_PREFIX, SaverConfig};
pub use encoding::{DecodeMode, PixelLayout};
pub use error::ExtractError;
pub use frame::{Frame, Header, Time};
pub use processor::{FrameDecoder, ImageProcessor};
pub use progress::{ProgressCallback, ProgressInfo};
pub use saver::ImageSaver;
pub use writer::{ImageFileWriter, RasterWriter};

//! Saver configuration.
//!
//! [`SaverConfig`] holds the output directory, file type and filename prefix
//! an [`ImageSaver`](crate::ImageSaver) writes with. It is fixed once the
//! saver is built.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use bagshot::SaverConfig;
//!
//! let config = SaverConfig::new("/tmp", "png").with_prefix("left_");
//! assert_eq!(
//!     config.output_path(123_456_789),
//!     Path::new("/tmp/left_123456789.png"),
//! );
//! ```

use std::path::{Path, PathBuf};

/// Filename prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "image";

/// Output settings for [`ImageSaver`](crate::ImageSaver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaverConfig {
    save_dir: PathBuf,
    file_type: String,
    prefix: String,
}

impl SaverConfig {
    /// Create a configuration writing `*.file_type` files into `save_dir`
    /// with the default `"image"` prefix.
    ///
    /// A leading `.` on the file type is dropped. The directory is expected
    /// to exist; it is not created.
    pub fn new(save_dir: impl Into<PathBuf>, file_type: impl AsRef<str>) -> Self {
        Self {
            save_dir: save_dir.into(),
            file_type: file_type.as_ref().trim_start_matches('.').to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Set the filename prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Directory the images are written to.
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Extension used for output files, without the leading dot.
    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    /// Text placed before the timestamp in each filename.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Destination for a frame captured at `timestamp_ns`:
    /// `{save_dir}/{prefix}{timestamp_ns}.{file_type}`.
    ///
    /// Frames sharing a timestamp map to the same path. The file always
    /// lands inside `save_dir`: leading path separators in the prefix are
    /// dropped so the name joins as a relative component.
    pub fn output_path(&self, timestamp_ns: u64) -> PathBuf {
        let file_name = format!("{}{}.{}", self.prefix, timestamp_ns, self.file_type);
        self.save_dir.join(file_name.trim_start_matches(['/', '\\']))
    }
}

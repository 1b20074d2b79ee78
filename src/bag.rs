//! Bag iteration and frame dispatch.
//!
//! [`ImageBagProcessor`] walks the chunks of a ROS 1 bag in file order,
//! picks out the `sensor_msgs/Image` messages published on one topic, and
//! hands each decoded [`Frame`] to the registered callbacks before reading
//! the next message.

use std::{
    collections::HashMap,
    fmt::Display,
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use rosbag::{ChunkRecord, MessageRecord, RosBag};

use crate::{
    error::ExtractError,
    frame::Frame,
    progress::{NoOpProgress, ProgressCallback, ProgressTracker},
};

/// ROS type name of the messages this processor understands.
pub const IMAGE_MESSAGE_TYPE: &str = "sensor_msgs/Image";

/// A raw message pulled out of a bag, with its connection details resolved.
#[derive(Debug, Clone, Copy)]
pub struct BagMessage<'m> {
    pub topic: &'m str,
    /// ROS type of the connection. Empty when unknown.
    pub message_type: &'m str,
    /// ROS 1 serialized payload.
    pub data: &'m [u8],
}

/// Counters for one processed bag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BagStats {
    /// Messages published on the configured topic.
    pub messages: u64,
    /// Frames handed to the callbacks.
    pub dispatched: u64,
    /// Messages on the topic that could not be turned into a frame.
    pub skipped: u64,
}

impl BagStats {
    fn absorb(&mut self, other: BagStats) {
        self.messages += other.messages;
        self.dispatched += other.dispatched;
        self.skipped += other.skipped;
    }
}

type FrameCallback<'a> = Box<dyn FnMut(&Frame) + 'a>;

/// Reads image messages for one topic and dispatches them to callbacks.
///
/// Callbacks may borrow from the caller's scope, which is how a single
/// [`ImageSaver`](crate::ImageSaver) is shared across every processed bag.
pub struct ImageBagProcessor<'a> {
    topic: String,
    callbacks: Vec<FrameCallback<'a>>,
    progress: Arc<dyn ProgressCallback>,
    batch_size: u64,
    totals: BagStats,
}

impl<'a> ImageBagProcessor<'a> {
    /// Create a processor that selects messages published on `topic`.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            callbacks: Vec::new(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
            totals: BagStats::default(),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires, in frames.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Counters accumulated over every bag processed so far.
    pub fn totals(&self) -> BagStats {
        self.totals
    }

    /// Register a consumer. Each frame is passed to every callback, in
    /// registration order.
    pub fn register_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&Frame) + 'a,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Read `path` and dispatch every image on the topic, in stored order.
    ///
    /// Returns once the whole bag has been dispatched. A bag without
    /// matching messages yields zeroed [`BagStats`]. Frames dispatched
    /// before a read error stay dispatched and are counted in
    /// [`totals`](Self::totals).
    ///
    /// Bags whose header points the index outside the file, as left behind
    /// by an interrupted recording, are rejected with
    /// [`ExtractError::BagRead`] before any message is read.
    pub fn process_bag(&mut self, path: impl AsRef<Path>) -> Result<BagStats, ExtractError> {
        let path = path.as_ref();
        log::debug!("Opening bag file: {}", path.display());

        let bag = RosBag::new(path).map_err(|error| ExtractError::BagOpen {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        check_chunk_section(path)?;

        let mut stats = BagStats::default();
        let mut tracker =
            ProgressTracker::new(self.progress.clone(), path.to_path_buf(), self.batch_size);

        let outcome = self.read_chunks(&bag, path, &mut stats, &mut tracker);

        tracker.finish();
        self.totals.absorb(stats);
        outcome?;

        log::info!(
            "Processed {}: {} frame(s) dispatched, {} skipped",
            path.display(),
            stats.dispatched,
            stats.skipped
        );
        Ok(stats)
    }

    fn read_chunks(
        &mut self,
        bag: &RosBag,
        path: &Path,
        stats: &mut BagStats,
        tracker: &mut ProgressTracker,
    ) -> Result<(), ExtractError> {
        let mut connections: HashMap<u32, (String, String)> = HashMap::new();

        for record in bag.chunk_records() {
            let chunk = match record.map_err(|error| read_error(path, error))? {
                ChunkRecord::Chunk(chunk) => chunk,
                ChunkRecord::IndexData(_) => continue,
            };

            for message in chunk.messages() {
                match message.map_err(|error| read_error(path, error))? {
                    MessageRecord::Connection(connection) => {
                        let previous = connections.insert(
                            connection.id,
                            (connection.topic.to_string(), connection.tp.to_string()),
                        );
                        if previous.is_none()
                            && connection.topic == self.topic
                            && connection.tp != IMAGE_MESSAGE_TYPE
                        {
                            log::warn!(
                                "Topic {} carries {}, not {IMAGE_MESSAGE_TYPE}; ignoring it",
                                connection.topic,
                                connection.tp
                            );
                        }
                    }
                    MessageRecord::MessageData(data) => {
                        let Some((topic, message_type)) = connections.get(&data.conn_id) else {
                            log::warn!(
                                "Message references unknown connection {} in {}",
                                data.conn_id,
                                path.display()
                            );
                            continue;
                        };
                        let message = BagMessage {
                            topic,
                            message_type,
                            data: data.data,
                        };
                        self.dispatch(message, stats, tracker);
                    }
                }
            }
        }
        Ok(())
    }

    /// Dispatch messages that were already read from a bag.
    pub fn process_messages<'m, I>(&mut self, messages: I) -> BagStats
    where
        I: IntoIterator<Item = BagMessage<'m>>,
    {
        let mut stats = BagStats::default();
        let mut tracker =
            ProgressTracker::new(self.progress.clone(), PathBuf::new(), self.batch_size);
        for message in messages {
            self.dispatch(message, &mut stats, &mut tracker);
        }
        tracker.finish();
        self.totals.absorb(stats);
        stats
    }

    fn dispatch(
        &mut self,
        message: BagMessage<'_>,
        stats: &mut BagStats,
        tracker: &mut ProgressTracker,
    ) {
        if message.topic != self.topic {
            return;
        }
        stats.messages += 1;

        if !message.message_type.is_empty() && message.message_type != IMAGE_MESSAGE_TYPE {
            stats.skipped += 1;
            return;
        }

        let frame = match Frame::from_bytes(message.data) {
            Ok(frame) => frame,
            Err(error) => {
                log::warn!("Skipping message on {}: {error}", self.topic);
                stats.skipped += 1;
                return;
            }
        };

        for callback in &mut self.callbacks {
            callback(&frame);
        }
        stats.dispatched += 1;
        tracker.advance(frame.timestamp_ns());
    }
}

/// Length of the `#ROSBAG V2.0\n` line that opens every bag.
const BAG_MAGIC_LEN: u64 = 13;

/// Reject bags whose recorded index position does not close the chunk
/// section inside the file.
///
/// Recorders write a zero `index_pos` first and patch it when the bag is
/// closed, so interrupted recordings and truncated copies both fail here.
fn check_chunk_section(path: &Path) -> Result<(), ExtractError> {
    let file = File::open(path).map_err(|error| read_error(path, error))?;
    let file_len = file
        .metadata()
        .map_err(|error| read_error(path, error))?
        .len();
    let (start, index_pos) =
        header_offsets(BufReader::new(file)).map_err(|error| read_error(path, error))?;

    if index_pos < start || index_pos > file_len {
        return Err(read_error(
            path,
            format!(
                "index position {index_pos} lies outside {start}..={file_len}; \
                 the bag is unindexed or truncated"
            ),
        ));
    }
    Ok(())
}

/// Parse the bag header record and return the offset of the first chunk
/// section record together with the recorded `index_pos`.
fn header_offsets(mut reader: impl Read) -> io::Result<(u64, u64)> {
    let mut magic = [0u8; BAG_MAGIC_LEN as usize];
    reader.read_exact(&mut magic)?;
    let header_len = read_u32(&mut reader)?;
    let mut header = vec![0u8; header_len as usize];
    reader.read_exact(&mut header)?;
    let data_len = read_u32(&mut reader)?;
    let start = BAG_MAGIC_LEN + 4 + u64::from(header_len) + 4 + u64::from(data_len);

    let mut fields = header.as_slice();
    while let Some((len, rest)) = fields.split_first_chunk::<4>() {
        let len = u32::from_le_bytes(*len) as usize;
        let Some(field) = rest.get(..len) else {
            break;
        };
        if let Some(value) = field.strip_prefix(b"index_pos=") {
            if let Ok(value) = <[u8; 8]>::try_from(value) {
                return Ok((start, u64::from_le_bytes(value)));
            }
        }
        fields = &rest[len..];
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "bag header has no index_pos field",
    ))
}

fn read_u32(reader: &mut impl Read) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_error(path: &Path, error: impl Display) -> ExtractError {
    ExtractError::BagRead {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}

//! Image frames as stored in ROS 1 bag files.
//!
//! A [`Frame`] is the in-memory form of a `sensor_msgs/Image` message. Bags
//! store messages in the ROS 1 wire format: little-endian fixed-width
//! integers, with strings and arrays prefixed by a `u32` length.

use crate::error::ExtractError;

/// ROS time: seconds and nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time {
    pub sec: u32,
    pub nsec: u32,
}

impl Time {
    pub fn new(sec: u32, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    /// Build a time from a nanosecond count.
    ///
    /// Seconds beyond `u32::MAX` saturate.
    pub fn from_nanos(nanos: u64) -> Self {
        let sec = (nanos / 1_000_000_000).min(u32::MAX as u64) as u32;
        Self {
            sec,
            nsec: (nanos % 1_000_000_000) as u32,
        }
    }

    /// Total nanoseconds, `sec * 10^9 + nsec`.
    pub fn as_nanos(&self) -> u64 {
        self.sec as u64 * 1_000_000_000 + self.nsec as u64
    }
}

/// `std_msgs/Header`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub seq: u32,
    pub stamp: Time,
    pub frame_id: String,
}

/// One `sensor_msgs/Image` message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    /// Pixel encoding tag, e.g. `"mono8"` or `"bayer_rggb8"`.
    pub encoding: String,
    pub is_bigendian: bool,
    /// Row length in bytes, including any padding.
    pub step: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Capture timestamp in nanoseconds.
    pub fn timestamp_ns(&self) -> u64 {
        self.header.stamp.as_nanos()
    }

    /// Deserialize a frame from a ROS 1 encoded `sensor_msgs/Image` payload.
    ///
    /// Bytes after the pixel data are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        let mut reader = MessageReader::new(bytes);

        let header = Header {
            seq: reader.read_u32("header.seq")?,
            stamp: Time {
                sec: reader.read_u32("header.stamp.sec")?,
                nsec: reader.read_u32("header.stamp.nsec")?,
            },
            frame_id: reader.read_string("header.frame_id")?,
        };

        Ok(Self {
            header,
            height: reader.read_u32("height")?,
            width: reader.read_u32("width")?,
            encoding: reader.read_string("encoding")?,
            is_bigendian: reader.read_u8("is_bigendian")? != 0,
            step: reader.read_u32("step")?,
            data: reader.read_bytes("data")?.to_vec(),
        })
    }

    /// Serialize into the ROS 1 wire format read by [`Frame::from_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            37 + self.header.frame_id.len() + self.encoding.len() + self.data.len(),
        );
        out.extend_from_slice(&self.header.seq.to_le_bytes());
        out.extend_from_slice(&self.header.stamp.sec.to_le_bytes());
        out.extend_from_slice(&self.header.stamp.nsec.to_le_bytes());
        write_bytes(&mut out, self.header.frame_id.as_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        write_bytes(&mut out, self.encoding.as_bytes());
        out.push(u8::from(self.is_bigendian));
        out.extend_from_slice(&self.step.to_le_bytes());
        write_bytes(&mut out, &self.data);
        out
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// Cursor over a serialized ROS 1 message.
struct MessageReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> MessageReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn take(&mut self, count: usize, field: &str) -> Result<&'a [u8], ExtractError> {
        let remaining = self.bytes.len() - self.position;
        if count > remaining {
            return Err(ExtractError::MessageParse(format!(
                "truncated at field `{field}`: need {count} bytes at offset {}, {remaining} left",
                self.position
            )));
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    fn read_u8(&mut self, field: &str) -> Result<u8, ExtractError> {
        Ok(self.take(1, field)?[0])
    }

    fn read_u32(&mut self, field: &str) -> Result<u32, ExtractError> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_bytes(&mut self, field: &str) -> Result<&'a [u8], ExtractError> {
        let length = self.read_u32(field)? as usize;
        self.take(length, field)
    }

    fn read_string(&mut self, field: &str) -> Result<String, ExtractError> {
        let bytes = self.read_bytes(field)?;
        String::from_utf8(bytes.to_vec()).map_err(|error| {
            ExtractError::MessageParse(format!("field `{field}` is not valid UTF-8: {error}"))
        })
    }
}

//! Builders for small uncompressed ROS 1 bag files.
//!
//! Only the records `bagshot` reads are produced: the bag header, chunks
//! holding connection and message data records, and index data records in
//! the chunk section. The index section is left empty.

#![allow(dead_code)]

use std::{fs, path::Path};

use bagshot::{Frame, Header, IMAGE_MESSAGE_TYPE, Time};

const MAGIC: &[u8] = b"#ROSBAG V2.0\n";
const BAG_HEADER_SIZE: usize = 4096;
const IMAGE_MD5SUM: &str = "060021388200f6f0f447d0fcd9c64743";

fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = (bytes.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(bytes);
    out
}

fn fields(fields: &[(&str, &[u8])]) -> Vec<u8> {
    fields
        .iter()
        .flat_map(|(name, value)| length_prefixed(&[name.as_bytes(), b"=", *value].concat()))
        .collect()
}

fn record(header: &[(&str, &[u8])], data: &[u8]) -> Vec<u8> {
    let mut out = length_prefixed(&fields(header));
    out.extend_from_slice(&length_prefixed(data));
    out
}

fn ros_time(timestamp_ns: u64) -> [u8; 8] {
    let time = Time::from_nanos(timestamp_ns);
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&time.sec.to_le_bytes());
    out[4..].copy_from_slice(&time.nsec.to_le_bytes());
    out
}

/// Connection record for `topic` carrying `message_type`.
pub fn connection(id: u32, topic: &str, message_type: &str) -> Vec<u8> {
    let data = fields(&[
        ("topic", topic.as_bytes()),
        ("type", message_type.as_bytes()),
        ("md5sum", IMAGE_MD5SUM.as_bytes()),
        ("message_definition", &b""[..]),
    ]);
    record(
        &[
            ("op", &[0x07][..]),
            ("conn", &id.to_le_bytes()[..]),
            ("topic", topic.as_bytes()),
        ],
        &data,
    )
}

/// Connection record for a `sensor_msgs/Image` topic.
pub fn image_connection(id: u32, topic: &str) -> Vec<u8> {
    connection(id, topic, IMAGE_MESSAGE_TYPE)
}

/// Message data record on connection `conn`, received at `timestamp_ns`.
pub fn message(conn: u32, timestamp_ns: u64, data: &[u8]) -> Vec<u8> {
    record(
        &[
            ("op", &[0x02][..]),
            ("conn", &conn.to_le_bytes()[..]),
            ("time", &ros_time(timestamp_ns)[..]),
        ],
        data,
    )
}

/// Uncompressed chunk record holding `records` in order.
pub fn chunk(records: &[Vec<u8>]) -> Vec<u8> {
    let data = records.concat();
    record(
        &[
            ("op", &[0x05][..]),
            ("compression", &b"none"[..]),
            ("size", &(data.len() as u32).to_le_bytes()[..]),
        ],
        &data,
    )
}

/// Chunk record whose declared size does not match its contents.
pub fn corrupt_chunk(records: &[Vec<u8>]) -> Vec<u8> {
    let data = records.concat();
    record(
        &[
            ("op", &[0x05][..]),
            ("compression", &b"none"[..]),
            ("size", &(data.len() as u32 + 1).to_le_bytes()[..]),
        ],
        &data,
    )
}

/// Index data record following a chunk, with `count` zeroed entries.
pub fn index_data(conn: u32, count: u32) -> Vec<u8> {
    record(
        &[
            ("op", &[0x04][..]),
            ("ver", &1u32.to_le_bytes()[..]),
            ("conn", &conn.to_le_bytes()[..]),
            ("count", &count.to_le_bytes()[..]),
        ],
        &vec![0u8; count as usize * 12],
    )
}

/// A complete bag whose chunk section holds `records`.
///
/// `index_pos` overrides the index position written to the header; by
/// default it points just past the chunk section.
pub fn bag_bytes(records: &[Vec<u8>], index_pos: Option<u64>) -> Vec<u8> {
    let chunk_section = records.concat();
    let end = (MAGIC.len() + BAG_HEADER_SIZE + chunk_section.len()) as u64;

    let header = fields(&[
        ("op", &[0x03][..]),
        ("index_pos", &index_pos.unwrap_or(end).to_le_bytes()[..]),
        ("conn_count", &0u32.to_le_bytes()[..]),
        ("chunk_count", &(records.len() as u32).to_le_bytes()[..]),
    ]);
    let padding = BAG_HEADER_SIZE - 8 - header.len();

    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&length_prefixed(&header));
    out.extend_from_slice(&length_prefixed(&vec![b' '; padding]));
    out.extend_from_slice(&chunk_section);
    out
}

pub fn write_bag(path: &Path, records: &[Vec<u8>]) {
    fs::write(path, bag_bytes(records, None)).expect("Failed to write bag");
}

pub fn write_bag_with_index_pos(path: &Path, records: &[Vec<u8>], index_pos: u64) {
    fs::write(path, bag_bytes(records, Some(index_pos))).expect("Failed to write bag");
}

/// Serialized 2x2 `mono8` image captured at `timestamp_ns`.
pub fn mono8_payload(timestamp_ns: u64, value: u8) -> Vec<u8> {
    Frame {
        header: Header {
            seq: 0,
            stamp: Time::from_nanos(timestamp_ns),
            frame_id: "camera".to_string(),
        },
        height: 2,
        width: 2,
        encoding: "mono8".to_string(),
        is_bigendian: false,
        step: 2,
        data: vec![value; 4],
    }
    .to_bytes()
}

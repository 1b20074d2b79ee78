//! Bag reading integration tests.
//!
//! These write small uncompressed bags into temporary directories and run
//! them through [`ImageBagProcessor::process_bag`].

mod support;

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use bagshot::{
    BagStats, ExtractError, ImageBagProcessor, ImageSaver, ProgressCallback, ProgressInfo,
    SaverConfig,
};
use support::{
    chunk, connection, corrupt_chunk, image_connection, index_data, message, mono8_payload,
    write_bag, write_bag_with_index_pos,
};

const TOPIC: &str = "/camera/image_raw";

fn single_frame_bag(path: &Path, timestamp_ns: u64) {
    write_bag(
        path,
        &[chunk(&[
            image_connection(0, TOPIC),
            message(0, timestamp_ns, &mono8_payload(timestamp_ns, 7)),
        ])],
    );
}

#[derive(Default)]
struct Recorder {
    reports: Mutex<Vec<(u64, bool)>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.reports
            .lock()
            .unwrap()
            .push((info.dispatched, info.finished));
    }
}

#[test]
fn frames_are_saved_in_stored_order() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let bag = directory.path().join("run.bag");
    let out_dir = directory.path().join("out");
    std::fs::create_dir(&out_dir).expect("Failed to create output dir");

    // The connection is only declared in the first chunk.
    write_bag(
        &bag,
        &[
            chunk(&[
                image_connection(0, TOPIC),
                message(0, 30, &mono8_payload(3_000, 30)),
                message(0, 10, &mono8_payload(1_000, 10)),
            ]),
            index_data(0, 2),
            chunk(&[message(0, 20, &mono8_payload(2_000, 20))]),
            index_data(0, 1),
        ],
    );

    let mut saver = ImageSaver::new(SaverConfig::new(&out_dir, "png"));
    let mut seen = Vec::new();
    let stats = {
        let mut processor = ImageBagProcessor::new(TOPIC);
        processor.register_callback(|frame| seen.push(frame.timestamp_ns()));
        processor.register_callback(|frame| saver.save(frame));
        processor.process_bag(&bag).expect("Failed to process bag")
    };

    assert_eq!(seen, vec![3_000, 1_000, 2_000]);
    assert_eq!(stats, BagStats { messages: 3, dispatched: 3, skipped: 0 });
    assert_eq!(saver.num_saved(), 3);
    for timestamp in [1_000, 2_000, 3_000] {
        let path = out_dir.join(format!("image{timestamp}.png"));
        assert!(path.is_file(), "{} was not written", path.display());
    }
}

#[test]
fn non_image_connection_on_topic_is_skipped() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let bag = directory.path().join("mixed.bag");
    write_bag(
        &bag,
        &[chunk(&[
            connection(0, TOPIC, "sensor_msgs/CompressedImage"),
            image_connection(1, TOPIC),
            image_connection(2, "/other/image_raw"),
            message(0, 1, &mono8_payload(1, 0)),
            message(1, 2, &mono8_payload(2, 0)),
            message(2, 3, &mono8_payload(3, 0)),
        ])],
    );

    let mut seen = Vec::new();
    let stats = {
        let mut processor = ImageBagProcessor::new(TOPIC);
        processor.register_callback(|frame| seen.push(frame.timestamp_ns()));
        processor.process_bag(&bag).expect("Failed to process bag")
    };

    assert_eq!(seen, vec![2]);
    assert_eq!(stats, BagStats { messages: 2, dispatched: 1, skipped: 1 });
}

#[test]
fn bags_are_processed_in_argument_order() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let first = directory.path().join("first.bag");
    let second = directory.path().join("second.bag");
    single_frame_bag(&first, 20);
    single_frame_bag(&second, 10);

    let mut seen = Vec::new();
    let mut processor = ImageBagProcessor::new(TOPIC);
    processor.register_callback(|frame| seen.push(frame.timestamp_ns()));
    for bag in [&first, &second] {
        processor.process_bag(bag).expect("Failed to process bag");
    }
    let totals = processor.totals();
    drop(processor);

    assert_eq!(seen, vec![20, 10]);
    assert_eq!(totals.dispatched, 2);
}

#[test]
fn unindexed_bag_is_a_read_error() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let unindexed = directory.path().join("unindexed.bag");
    let truncated = directory.path().join("truncated.bag");
    let good = directory.path().join("good.bag");
    let records = [chunk(&[
        image_connection(0, TOPIC),
        message(0, 5, &mono8_payload(5, 0)),
    ])];
    write_bag_with_index_pos(&unindexed, &records, 0);
    write_bag_with_index_pos(&truncated, &records, u64::from(u32::MAX));
    single_frame_bag(&good, 9);

    let mut seen = Vec::new();
    let mut processor = ImageBagProcessor::new(TOPIC);
    processor.register_callback(|frame| seen.push(frame.timestamp_ns()));

    for bag in [&unindexed, &truncated] {
        match processor.process_bag(bag) {
            Err(ExtractError::BagRead { path, .. }) => assert_eq!(&path, bag),
            other => panic!("Expected a read error for {}, got {other:?}", bag.display()),
        }
    }
    let stats = processor.process_bag(&good).expect("Failed to process bag");
    drop(processor);

    assert_eq!(stats.dispatched, 1);
    assert_eq!(seen, vec![9]);
}

#[test]
fn read_error_keeps_frames_dispatched_before_it() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let bag = directory.path().join("damaged.bag");
    let out_dir = directory.path().join("out");
    std::fs::create_dir(&out_dir).expect("Failed to create output dir");
    write_bag(
        &bag,
        &[
            chunk(&[
                image_connection(0, TOPIC),
                message(0, 1, &mono8_payload(1, 0)),
                message(0, 2, &mono8_payload(2, 0)),
            ]),
            corrupt_chunk(&[message(0, 3, &mono8_payload(3, 0))]),
        ],
    );

    let recorder = Arc::new(Recorder::default());
    let mut saver = ImageSaver::new(SaverConfig::new(&out_dir, "png"));
    let (result, totals) = {
        let mut processor = ImageBagProcessor::new(TOPIC).with_progress(recorder.clone());
        processor.register_callback(|frame| saver.save(frame));
        let result = processor.process_bag(&bag);
        (result, processor.totals())
    };

    assert!(matches!(result, Err(ExtractError::BagRead { .. })), "{result:?}");
    assert_eq!(totals.dispatched, 2);
    assert_eq!(saver.num_saved(), 2);
    assert_eq!(recorder.reports.lock().unwrap().last(), Some(&(2, true)));
}

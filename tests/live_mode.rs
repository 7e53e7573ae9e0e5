use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use image::RgbImage;

use arm_angles::error::LiveError;
use arm_angles::live::{AsyncLandmarker, LatestSlot};
use arm_angles::pipeline::PosePipeline;
use arm_angles::types::{Landmark, PoseResult, Skeleton};

/// Takes a while per frame so requests pile up.
struct Slow;

impl PosePipeline for Slow {
    fn name(&self) -> String {
        "slow".to_string()
    }

    fn process(&mut self, _frame: &RgbImage) -> Result<Option<PoseResult>> {
        thread::sleep(Duration::from_millis(30));
        Ok(Some(PoseResult::new(
            Skeleton::Coco17,
            vec![Landmark::new(0.5, 0.5, 0.9); 17],
        )))
    }
}

#[test]
fn busy_landmarker_drops_frames_and_latest_wins() {
    let slot: LatestSlot<i64> = LatestSlot::new();
    let writer = slot.clone();
    let callbacks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&callbacks);

    let mut landmarker = AsyncLandmarker::spawn(Slow, move |_, ts| {
        counter.fetch_add(1, Ordering::SeqCst);
        writer.publish(ts);
    })
    .unwrap();

    let mut accepted = Vec::new();
    for i in 1..=40 {
        let ts = i * 33;
        if landmarker.detect_async(RgbImage::new(8, 8), ts).unwrap() {
            accepted.push(ts);
        }
    }
    landmarker.close();

    assert!(!accepted.is_empty());
    // One frame being processed plus one queued; the rest are dropped
    assert!(accepted.len() < 40, "accepted {accepted:?}");
    assert_eq!(callbacks.load(Ordering::SeqCst), accepted.len());
    assert_eq!(slot.latest(), accepted.last().copied());
}

#[test]
fn timestamps_going_backwards_are_rejected() {
    let mut landmarker = AsyncLandmarker::spawn(Slow, |_, _| {}).unwrap();
    landmarker.detect_async(RgbImage::new(8, 8), 100).unwrap();

    let err = landmarker.detect_async(RgbImage::new(8, 8), 67).unwrap_err();
    assert_eq!(err, LiveError::NonMonotonicTimestamp { last: 100, got: 67 });
    assert!(err.to_string().contains("67"));

    // The rejected call does not move the clock
    assert!(landmarker.detect_async(RgbImage::new(8, 8), 101).is_ok());
}

#[test]
fn slot_take_empties_it() {
    let slot = LatestSlot::new();
    slot.publish(Landmark::new(0.1, 0.2, 0.3));
    slot.publish(Landmark::new(0.4, 0.5, 0.6));
    assert_eq!(slot.take().map(|l| l.x), Some(0.4));
    assert!(slot.take().is_none());
}

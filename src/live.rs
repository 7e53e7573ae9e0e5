//! Live-stream mode: frames go to a landmarker thread fire-and-forget, and
//! results come back through a callback.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use crossbeam_channel::{bounded, Sender, TrySendError};
use image::RgbImage;
use log::{info, warn};
use parking_lot::Mutex;

use crate::error::LiveError;
use crate::pipeline::PosePipeline;
use crate::types::PoseResult;

/// Single shared value, overwritten by the producer and read by the renderer.
/// Latest value wins; readers never see a partially written value.
pub struct LatestSlot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    pub fn publish(&self, value: T) {
        *self.inner.lock() = Some(value);
    }

    pub fn take(&self) -> Option<T> {
        self.inner.lock().take()
    }
}

impl<T: Clone> LatestSlot<T> {
    pub fn latest(&self) -> Option<T> {
        self.inner.lock().clone()
    }
}

type Request = (RgbImage, i64);

/// Runs a pose pipeline on its own thread and reports through `callback`.
pub struct AsyncLandmarker {
    requests: Option<Sender<Request>>,
    last_timestamp: Option<i64>,
    handle: Option<JoinHandle<()>>,
}

impl AsyncLandmarker {
    pub fn spawn<P, F>(mut pipeline: P, mut callback: F) -> Result<Self>
    where
        P: PosePipeline + Send + 'static,
        F: FnMut(PoseResult, i64) + Send + 'static,
    {
        // One frame queued behind the one being processed; more are dropped
        let (tx, rx) = bounded::<Request>(1);

        let handle = thread::Builder::new()
            .name("landmarker".to_string())
            .spawn(move || {
                info!("Landmarker started: {}", pipeline.name());
                while let Ok((frame, timestamp_ms)) = rx.recv() {
                    match pipeline.process(&frame) {
                        Ok(Some(pose)) => callback(pose, timestamp_ms),
                        Ok(None) => {}
                        Err(e) => warn!("Landmarker failed at {} ms: {}", timestamp_ms, e),
                    }
                }
                info!("Landmarker stopped");
            })?;

        Ok(Self {
            requests: Some(tx),
            last_timestamp: None,
            handle: Some(handle),
        })
    }

    /// Queues a frame for detection. Returns `Ok(false)` when the landmarker
    /// was busy and the frame was dropped.
    pub fn detect_async(&mut self, frame: RgbImage, timestamp_ms: i64) -> Result<bool, LiveError> {
        if let Some(last) = self.last_timestamp {
            if timestamp_ms <= last {
                return Err(LiveError::NonMonotonicTimestamp {
                    last,
                    got: timestamp_ms,
                });
            }
        }
        let tx = self.requests.as_ref().ok_or(LiveError::Closed)?;
        self.last_timestamp = Some(timestamp_ms);

        match tx.try_send((frame, timestamp_ms)) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(LiveError::Closed),
        }
    }

    /// Stops accepting frames and waits until the queued ones are processed.
    pub fn close(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AsyncLandmarker {
    fn drop(&mut self) {
        self.close();
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use image::{imageops, RgbImage};
use log::{error, info};

use crate::camera::FrameSource;
use crate::error::{CaptureError, SessionError, TelemetryError};
use crate::overlay::fit_to_width;
use crate::pipeline::PosePipeline;
use crate::telemetry::TelemetrySink;
use crate::tracker::ArmTracker;
use crate::types::AngleReading;

/// Messages from the capture thread to the UI.
#[derive(Debug)]
pub enum WorkerEvent {
    /// A processed frame, mirrored and scaled for display, with the angles
    /// sent for it (if any).
    Frame {
        frame: RgbImage,
        reading: Option<AngleReading>,
    },
    /// The session ended. Always the last event.
    Error(SessionError),
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub tracker: ArmTracker,
    pub display_width: u32,
    pub mirror: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            tracker: ArmTracker::default(),
            display_width: 1020,
            mirror: true,
        }
    }
}

// Frames beyond this are dropped while the UI catches up
const EVENT_CAPACITY: usize = 2;

/// One background capture session. At most one should be alive at a time;
/// stop the previous one before spawning the next.
pub struct CaptureWorker {
    stop: Arc<AtomicBool>,
    events: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    /// Starts the capture thread. The camera and the telemetry link are opened
    /// on that thread and released there on every exit path.
    pub fn spawn<S, K, OpenSource, OpenSink>(
        open_source: OpenSource,
        pipeline: Box<dyn PosePipeline + Send>,
        open_sink: OpenSink,
        settings: WorkerSettings,
    ) -> Result<Self>
    where
        S: FrameSource + 'static,
        K: TelemetrySink + 'static,
        OpenSource: FnOnce() -> Result<S, CaptureError> + Send + 'static,
        OpenSink: FnOnce() -> Result<Option<K>, TelemetryError> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = bounded(EVENT_CAPACITY);

        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                info!("Capture worker started");
                match run_session(open_source, pipeline, open_sink, &settings, &thread_stop, &tx) {
                    Ok(()) => info!("Capture worker stopped"),
                    Err(e) => {
                        error!("Capture worker failed: {}", e);
                        // Blocks only while the UI is still listening
                        let _ = tx.send(WorkerEvent::Error(e));
                    }
                }
            })?;

        Ok(Self {
            stop,
            events: rx,
            handle: Some(handle),
        })
    }

    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// All events queued so far, oldest first.
    pub fn drain(&self) -> Vec<WorkerEvent> {
        self.events.try_iter().collect()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Asks the thread to exit before its next frame.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Requests a stop, discards pending events and waits for the thread so
    /// the camera is free to reopen.
    pub fn stop_and_join(mut self) {
        self.request_stop();
        loop {
            match self.events.recv_timeout(Duration::from_millis(50)) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if !self.is_running() {
                        break;
                    }
                }
            }
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        // Detached: the thread notices the flag or the closed channel and exits
        self.request_stop();
    }
}

fn run_session<S, K, OpenSource, OpenSink>(
    open_source: OpenSource,
    mut pipeline: Box<dyn PosePipeline + Send>,
    open_sink: OpenSink,
    settings: &WorkerSettings,
    stop: &AtomicBool,
    tx: &Sender<WorkerEvent>,
) -> Result<(), SessionError>
where
    S: FrameSource,
    K: TelemetrySink,
    OpenSource: FnOnce() -> Result<S, CaptureError>,
    OpenSink: FnOnce() -> Result<Option<K>, TelemetryError>,
{
    // Both handles live until this function returns
    let mut source = open_source()?;
    let mut sink = open_sink()?;

    while !stop.load(Ordering::SeqCst) {
        let mut frame = source.next_frame()?;

        let pose = pipeline.process(&frame).map_err(SessionError::Inference)?;
        let reading = settings
            .tracker
            .process_frame(&mut frame, pose.as_ref(), sink.as_mut())?;

        if settings.mirror {
            imageops::flip_horizontal_in_place(&mut frame);
        }
        let display = fit_to_width(&frame, settings.display_width);

        match tx.try_send(WorkerEvent::Frame {
            frame: display,
            reading,
        }) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
    Ok(())
}

//! Error types for capture, telemetry and the live landmarker.

use thiserror::Error;

/// Failures of the camera side of the capture loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened or its stream could not be started.
    #[error("Camera could not be opened (index {index}): {reason}")]
    CameraOpen {
        /// Requested camera index.
        index: u32,
        /// Backend message.
        reason: String,
    },

    /// A frame could not be read or decoded.
    #[error("Failed to capture image from camera: {0}")]
    FrameRead(String),
}

impl CaptureError {
    /// Creates a device-open error.
    #[must_use]
    pub fn open(index: u32, reason: impl Into<String>) -> Self {
        Self::CameraOpen {
            index,
            reason: reason.into(),
        }
    }
}

/// Failures of the serial telemetry link.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The serial device could not be opened.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        /// Device name, e.g. `/dev/ttyUSB0` or `COM3`.
        port: String,
        /// Driver error.
        #[source]
        source: serialport::Error,
    },

    /// Writing a message failed.
    #[error("failed to write telemetry: {0}")]
    Write(#[from] std::io::Error),
}

/// Anything that ends a capture session. Each variant is terminal: the worker
/// reports it once and exits.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("pose inference failed: {0}")]
    Inference(#[source] anyhow::Error),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Misuse of the asynchronous landmarker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LiveError {
    /// Timestamps passed to `detect_async` must strictly increase.
    #[error("timestamp {got} ms is not after the previous {last} ms")]
    NonMonotonicTimestamp {
        /// Previously accepted timestamp.
        last: i64,
        /// Rejected timestamp.
        got: i64,
    },

    /// The inference thread has exited.
    #[error("landmarker has shut down")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_open_display() {
        let err = CaptureError::open(3, "device busy");
        let msg = format!("{err}");
        assert!(msg.contains("Camera could not be opened"));
        assert!(msg.contains('3'));
        assert!(msg.contains("device busy"));
    }

    #[test]
    fn session_error_is_transparent_for_capture() {
        let err: SessionError = CaptureError::FrameRead("timeout".to_string()).into();
        assert_eq!(
            format!("{err}"),
            "Failed to capture image from camera: timeout"
        );
    }

    #[test]
    fn telemetry_write_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged");
        let err: SessionError = TelemetryError::from(io).into();
        assert!(format!("{err}").contains("unplugged"));
    }

    #[test]
    fn inference_error_keeps_message() {
        let err = SessionError::Inference(anyhow::anyhow!("bad tensor shape"));
        assert!(format!("{err}").contains("bad tensor shape"));
    }

    #[test]
    fn non_monotonic_display() {
        let err = LiveError::NonMonotonicTimestamp { last: 66, got: 33 };
        let msg = format!("{err}");
        assert!(msg.contains("66"));
        assert!(msg.contains("33"));
    }
}

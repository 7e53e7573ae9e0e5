use image::RgbImage;
use log::debug;

use crate::angle::arm_angle;
use crate::error::TelemetryError;
use crate::overlay::{draw_arm, OverlayStyle};
use crate::telemetry::TelemetrySink;
use crate::types::{AngleReading, ArmTriple, PoseResult, Side};

/// Per-frame arm logic: visibility gate, overlay, elbow angles, telemetry.
#[derive(Debug, Clone)]
pub struct ArmTracker {
    visibility_threshold: f32,
    style: OverlayStyle,
}

impl ArmTracker {
    pub fn new(visibility_threshold: f32, style: OverlayStyle) -> Self {
        Self {
            visibility_threshold,
            style,
        }
    }

    /// Both arms, when both shoulders are confidently visible.
    pub fn visible_arms(&self, pose: &PoseResult) -> Option<(ArmTriple, ArmTriple)> {
        let left = pose.arm(Side::Left)?;
        let right = pose.arm(Side::Right)?;
        let gate = self.visibility_threshold;
        if left.shoulder.visibility > gate && right.shoulder.visibility > gate {
            Some((left, right))
        } else {
            None
        }
    }

    pub fn reading(&self, pose: &PoseResult) -> Option<AngleReading> {
        self.visible_arms(pose).map(|(left, right)| AngleReading {
            left_degrees: arm_angle(&left),
            right_degrees: arm_angle(&right),
        })
    }

    /// Draws and transmits for one frame.
    ///
    /// A missing, short or low-visibility pose is skipped silently and leaves
    /// the frame untouched. Only a transport failure is an error.
    pub fn process_frame<K: TelemetrySink + ?Sized>(
        &self,
        frame: &mut RgbImage,
        pose: Option<&PoseResult>,
        sink: Option<&mut K>,
    ) -> Result<Option<AngleReading>, TelemetryError> {
        let Some((left, right)) = pose.and_then(|p| self.visible_arms(p)) else {
            return Ok(None);
        };

        draw_arm(frame, &left, &self.style);
        draw_arm(frame, &right, &self.style);

        let reading = AngleReading {
            left_degrees: arm_angle(&left),
            right_degrees: arm_angle(&right),
        };
        debug!(
            "L {:.1} R {:.1}",
            reading.left_degrees, reading.right_degrees
        );

        if let Some(sink) = sink {
            sink.send_reading(&reading)?;
        }
        Ok(Some(reading))
    }
}

impl Default for ArmTracker {
    fn default() -> Self {
        Self::new(0.5, OverlayStyle::default())
    }
}

use std::path::Path;

use anyhow::{bail, Result};
use image::RgbImage;
use log::{info, warn};

use crate::config::TrackingConfig;
use crate::inference::OnnxPosePipeline;
use crate::types::{Landmark, PoseResult, Skeleton};

pub trait PosePipeline {
    fn name(&self) -> String;
    /// Landmarks of the most prominent person, or `None` when nobody is found.
    fn process(&mut self, frame: &RgbImage) -> Result<Option<PoseResult>>;
}

impl<P: PosePipeline + ?Sized> PosePipeline for Box<P> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn process(&mut self, frame: &RgbImage) -> Result<Option<PoseResult>> {
        (**self).process(frame)
    }
}

// Stand-in when no ONNX model is available
pub struct SimulatedPosePipeline {
    frame_count: u32,
}

impl SimulatedPosePipeline {
    pub fn new() -> Self {
        Self { frame_count: 0 }
    }
}

impl Default for SimulatedPosePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl PosePipeline for SimulatedPosePipeline {
    fn name(&self) -> String {
        "No ONNX (Simulated Arms)".to_string()
    }

    fn process(&mut self, _frame: &RgbImage) -> Result<Option<PoseResult>> {
        self.frame_count += 1;

        // Forearms swing around the elbows in opposite directions
        let t = self.frame_count as f32 * 0.05;
        let swing = t.sin() * std::f32::consts::FRAC_PI_3;
        let forearm = 0.15;

        let mut landmarks = vec![Landmark::new(0.5, 0.2, 0.0); Skeleton::Coco17.landmark_count()];
        // Nose
        landmarks[0] = Landmark::new(0.5, 0.2, 0.3);

        landmarks[5] = Landmark::new(0.38, 0.35, 0.95);
        landmarks[7] = Landmark::new(0.30, 0.50, 0.95);
        landmarks[9] = Landmark::new(
            0.30 - forearm * swing.cos(),
            0.50 - forearm * swing.sin(),
            0.95,
        );

        landmarks[6] = Landmark::new(0.62, 0.35, 0.95);
        landmarks[8] = Landmark::new(0.70, 0.50, 0.95);
        landmarks[10] = Landmark::new(
            0.70 + forearm * swing.cos(),
            0.50 - forearm * swing.sin(),
            0.95,
        );

        Ok(Some(PoseResult::new(Skeleton::Coco17, landmarks)))
    }
}

/// Loads the ONNX pose model. A missing file is an error unless simulation
/// was asked for.
pub fn create_pipeline(config: &TrackingConfig) -> Result<Box<dyn PosePipeline + Send>> {
    if config.simulate {
        warn!("Simulation enabled. Arms are synthetic and serial output is off.");
        return Ok(Box::new(SimulatedPosePipeline::new()));
    }
    if !Path::new(&config.model_path).exists() {
        bail!(
            "Pose model {} not found. Pass --model or --simulate.",
            config.model_path
        );
    }
    let pipeline = OnnxPosePipeline::new(
        &config.model_path,
        config.input_size,
        config.score_threshold,
    )?;
    info!("Active pipeline: {}", pipeline.name());
    Ok(Box::new(pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    #[test]
    fn simulated_pose_is_always_trackable() {
        let mut pipeline = SimulatedPosePipeline::new();
        let frame = RgbImage::new(8, 8);
        for _ in 0..50 {
            let pose = pipeline.process(&frame).unwrap().unwrap();
            assert_eq!(pose.skeleton, Skeleton::Coco17);
            assert!(pose.shoulder(Side::Left).unwrap().visibility > 0.5);
            assert!(pose.arm(Side::Right).is_some());
        }
    }

    #[test]
    fn missing_model_is_an_error() {
        let config = TrackingConfig {
            model_path: "does/not/exist.onnx".to_string(),
            ..TrackingConfig::default()
        };
        let err = create_pipeline(&config).err().unwrap();
        assert!(err.to_string().contains("does/not/exist.onnx"));
    }

    #[test]
    fn simulation_must_be_requested() {
        let config = TrackingConfig {
            model_path: "does/not/exist.onnx".to_string(),
            simulate: true,
            ..TrackingConfig::default()
        };
        let pipeline = create_pipeline(&config).unwrap();
        assert!(pipeline.name().contains("Simulated"));
    }
}

use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, RgbImage};
use log::info;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

use crate::pipeline::PosePipeline;
use crate::types::{Landmark, PoseResult, Skeleton};

const BOX_CHANNELS: usize = 4;
const KPT_STEP: usize = 3;

/// YOLOv8-pose exported to ONNX: input `[1, 3, S, S]`, output `[1, 56, N]`
/// (box, person score, 17 keypoints of x, y, confidence).
pub struct OnnxPosePipeline {
    session: Session,
    input_size: u32,
    score_threshold: f32,
}

impl OnnxPosePipeline {
    pub fn new(model_path: &str, input_size: u32, score_threshold: f32) -> Result<Self> {
        info!("Loading pose model from {}...", model_path);
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::<()>::from)?
            .with_intra_threads(4)
            .map_err(ort::Error::<()>::from)?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load pose model {}", model_path))?;

        Ok(Self {
            session,
            input_size,
            score_threshold,
        })
    }

    /// HWC u8 -> NCHW f32 in 0..1. The frame is stretched to a square, so
    /// keypoints divided by the input size are already frame fractions.
    fn preprocess(&self, frame: &RgbImage) -> Vec<f32> {
        let size = self.input_size;
        let resized = image::imageops::resize(frame, size, size, FilterType::Triangle);
        let plane = (size * size) as usize;
        let mut input = vec![0.0f32; 3 * plane];
        for (i, pixel) in resized.pixels().enumerate() {
            input[i] = pixel[0] as f32 / 255.0;
            input[plane + i] = pixel[1] as f32 / 255.0;
            input[2 * plane + i] = pixel[2] as f32 / 255.0;
        }
        input
    }
}

impl PosePipeline for OnnxPosePipeline {
    fn name(&self) -> String {
        "YOLOv8 Pose (17 pts)".to_string()
    }

    fn process(&mut self, frame: &RgbImage) -> Result<Option<PoseResult>> {
        let size = self.input_size as usize;
        let input = self.preprocess(frame);
        let input_tensor = Tensor::from_array((vec![1, 3, size, size], input))?;
        let outputs = self.session.run(ort::inputs![input_tensor])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        if shape.len() != 3 {
            bail!("Unexpected pose output rank {}", shape.len());
        }
        let channels = shape[1] as usize;
        let anchors = shape[2] as usize;

        decode_best_pose(
            data,
            channels,
            anchors,
            self.input_size as f32,
            self.score_threshold,
        )
    }
}

/// Picks the highest-scoring candidate from a channel-major `[channels, anchors]`
/// block and returns its keypoints normalized by `input_size`.
pub fn decode_best_pose(
    data: &[f32],
    channels: usize,
    anchors: usize,
    input_size: f32,
    score_threshold: f32,
) -> Result<Option<PoseResult>> {
    let nk = Skeleton::Coco17.landmark_count();
    let expected = BOX_CHANNELS + 1 + KPT_STEP * nk;
    if channels != expected {
        bail!(
            "Pose output has {} channels, expected {} (single-class, 17 keypoints)",
            channels,
            expected
        );
    }
    if data.len() < channels * anchors {
        bail!(
            "Pose output holds {} values, shape needs {}",
            data.len(),
            channels * anchors
        );
    }

    let at = |c: usize, i: usize| data[c * anchors + i];

    let best = (0..anchors)
        .map(|i| (i, at(BOX_CHANNELS, i)))
        .filter(|&(_, score)| score >= score_threshold)
        .max_by(|a, b| a.1.total_cmp(&b.1));

    let Some((anchor, _)) = best else {
        return Ok(None);
    };

    let landmarks = (0..nk)
        .map(|k| {
            let base = BOX_CHANNELS + 1 + KPT_STEP * k;
            Landmark::new(
                at(base, anchor) / input_size,
                at(base + 1, anchor) / input_size,
                at(base + 2, anchor),
            )
        })
        .collect();

    Ok(Some(PoseResult::new(Skeleton::Coco17, landmarks)))
}

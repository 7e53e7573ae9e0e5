//! Live-stream variant: frames are handed to the landmarker without waiting,
//! and every tick renders whatever left shoulder arrived last.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use image::{Rgb, RgbImage};
use log::{debug, info};
use minifb::Key;

use arm_angles::args::LiveArgs;
use arm_angles::camera::{CameraSource, FrameSource};
use arm_angles::config::AppConfig;
use arm_angles::live::{AsyncLandmarker, LatestSlot};
use arm_angles::output::WindowOutput;
use arm_angles::overlay::{draw_landmark, OverlayStyle};
use arm_angles::pipeline::create_pipeline;
use arm_angles::types::{Landmark, PoseResult, Side};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = LiveArgs::parse();

    let mut config = AppConfig::load_from(&args.config)?;
    if let Some(model) = args.model {
        config.tracking.model_path = model;
    }
    if args.simulate {
        config.tracking.simulate = true;
    }
    let live = config.live.clone();
    let index = args.cam_index.unwrap_or(live.cam_index);

    let mut camera =
        CameraSource::open(index).with_context(|| format!("Live mode needs camera {}", index))?;
    let pipeline = create_pipeline(&config.tracking)?;

    let left_shoulder: LatestSlot<Landmark> = LatestSlot::new();
    let writer = left_shoulder.clone();
    let mut landmarker = AsyncLandmarker::spawn(pipeline, move |pose: PoseResult, _ts: i64| {
        if let Some(shoulder) = pose.shoulder(Side::Left) {
            writer.publish(shoulder);
        }
    })?;

    let (width, height) = (live.canvas_width, live.canvas_height);
    let mut window = WindowOutput::new("Shoulder Live", width as usize, height as usize)?;
    let style = OverlayStyle::from(&config.overlay);
    let step_ms = live.frame_interval_ms.max(1);
    let interval = Duration::from_millis(step_ms);

    info!(
        "Streaming camera {} ({}, {}x{}). Esc quits.",
        index,
        camera.name(),
        camera.width(),
        camera.height()
    );
    let mut timestamp_ms: i64 = 0;
    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame = camera.next_frame()?;
        landmarker.detect_async(frame, timestamp_ms)?;
        timestamp_ms += step_ms as i64;

        thread::sleep(interval);

        let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        if let Some(shoulder) = left_shoulder.latest() {
            debug!("Left shoulder x={:.3} y={:.3}", shoulder.x, shoulder.y);
            draw_landmark(&mut canvas, &shoulder, style.dot_radius, style.dot_color);
        }
        window.present(&canvas)?;
    }

    landmarker.close();
    Ok(())
}

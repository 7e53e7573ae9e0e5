use image::RgbImage;
use log::{debug, info};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use colored::*;

use crate::error::CaptureError;

/// Anything that yields RGB frames one at a time.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<RgbImage, CaptureError>;
}

pub struct CameraSource {
    camera: Camera,
    index: u32,
}

impl CameraSource {
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CaptureError::open(index, e.to_string()))?;

        camera
            .open_stream()
            .map_err(|e| CaptureError::open(index, e.to_string()))?;

        info!(
            "Opened camera {}: {} ({})",
            index,
            camera.info().human_name(),
            camera.camera_format()
        );

        Ok(Self { camera, index })
    }

    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }

    pub fn name(&self) -> String {
        self.camera.info().human_name()
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<RgbImage, CaptureError> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| CaptureError::FrameRead(e.to_string()))?;
        frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::FrameRead(e.to_string()))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
        info!("Released camera {}", self.index);
    }
}

/// Indices in `0..count` that can be opened. Each probe is released right away.
pub fn probe_cameras(count: u32) -> Vec<u32> {
    (0..count)
        .filter(|&index| match CameraSource::open(index) {
            Ok(_) => true,
            Err(e) => {
                debug!("Probe skipped camera {}: {}", index, e);
                false
            }
        })
        .collect()
}

/// Prints the devices the platform backend reports.
pub fn list_cameras() -> anyhow::Result<()> {
    let cameras = nokhwa::query(ApiBackend::Auto)?;
    println!("{}", "Available Cameras:".bold());
    println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {:?}", cam.index(), cam.human_name(), cam.misc());
    }
    Ok(())
}

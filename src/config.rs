use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use log::{info, warn};

use crate::telemetry::SerialLink;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub display: DisplayConfig,
    pub telemetry: TelemetryConfig,
    pub tracking: TrackingConfig,
    pub overlay: OverlayConfig,
    pub live: LiveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub mirror: bool,
    /// Camera indices 0..probe_count are probed at startup.
    pub probe_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Both shoulders must exceed this before anything is drawn or sent.
    pub visibility_threshold: f32,
    pub model_path: String,
    pub input_size: u32,
    pub score_threshold: f32,
    /// Run the waving-arms stand-in instead of the model. Serial output is
    /// disabled while it is active.
    pub simulate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub dot_radius: i32,
    pub dot_color_hex: String, // e.g. "#FF0000"
    pub line_color_hex: String,
    pub line_thickness: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub cam_index: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub frame_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1020,
            height: 720,
            mirror: true,
            probe_count: 5,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            baud_rate: SerialLink::DEFAULT_BAUD,
            timeout_ms: SerialLink::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl TrackingConfig {
    /// Simulated arms never reach real hardware.
    pub fn telemetry_allowed(&self) -> bool {
        !self.simulate
    }
}

impl TelemetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
            model_path: "models/yolov8n-pose.onnx".to_string(),
            input_size: 640,
            score_threshold: 0.5,
            simulate: false,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            dot_radius: 10,
            dot_color_hex: "#FF0000".to_string(),
            line_color_hex: "#FFFFFF".to_string(),
            line_thickness: 2,
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            cam_index: 2,
            canvas_width: 680,
            canvas_height: 480,
            frame_interval_ms: 33,
        }
    }
}

impl AppConfig {
    pub const PATH: &'static str = "config.json";

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            // Missing fields fall back to Default via #[serde(default)]
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    warn!("Error parsing config: {}. Loading defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        // Write back so new fields show up in the file
        config.save_to(path)?;

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Parses `#RRGGBB` (leading `#` optional). Malformed input gives white.
pub fn parse_hex(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return (255, 255, 255);
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(255);
    (channel(0), channel(2), channel(4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_protocol() {
        let config = AppConfig::default();
        assert_eq!(config.telemetry.baud_rate, 9600);
        assert_eq!(config.telemetry.timeout(), Duration::from_secs(1));
        assert_eq!(config.tracking.visibility_threshold, 0.5);
        assert_eq!(config.display.probe_count, 5);
        assert_eq!(config.overlay.dot_radius, 10);
        assert_eq!(config.live.cam_index, 2);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn partial_file_keeps_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "telemetry": { "baud_rate": 115200 } }"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.telemetry.baud_rate, 115200);
        assert_eq!(config.telemetry.timeout_ms, 1000);
        assert_eq!(config.display, DisplayConfig::default());

        // Written back with every field populated
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("visibility_threshold"));
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn simulation_is_opt_in_and_mutes_telemetry() {
        let tracking = TrackingConfig::default();
        assert!(!tracking.simulate);
        assert!(tracking.telemetry_allowed());

        let config: AppConfig =
            serde_json::from_str(r#"{ "tracking": { "simulate": true } }"#).unwrap();
        assert!(config.tracking.simulate);
        assert!(!config.tracking.telemetry_allowed());
        assert_eq!(config.tracking.input_size, 640);
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex("#FF0000"), (255, 0, 0));
        assert_eq!(parse_hex("00ff7f"), (0, 255, 127));
        assert_eq!(parse_hex("#FFF"), (255, 255, 255));
    }
}

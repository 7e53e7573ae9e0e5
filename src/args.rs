use clap::Parser;

/// Windowed arm tracker with serial angle output
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available cameras and serial ports
    #[arg(long)]
    pub list: bool,

    /// Pose model (ONNX); overrides tracking.model_path
    #[arg(long)]
    pub model: Option<String>,

    /// Use synthetic arms instead of the model (serial output stays off)
    #[arg(long)]
    pub simulate: bool,

    /// Serial baud rate; overrides telemetry.baud_rate
    #[arg(long)]
    pub baud: Option<u32>,

    /// Config file
    #[arg(long, default_value = crate::config::AppConfig::PATH)]
    pub config: String,
}

/// Live-stream shoulder tracker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct LiveArgs {
    /// Camera Index; overrides live.cam_index (default 2)
    #[arg(short, long)]
    pub cam_index: Option<u32>,

    /// Pose model (ONNX); overrides tracking.model_path
    #[arg(long)]
    pub model: Option<String>,

    /// Use synthetic arms instead of the model
    #[arg(long)]
    pub simulate: bool,

    /// Config file
    #[arg(long, default_value = crate::config::AppConfig::PATH)]
    pub config: String,
}

pub mod angle;
pub mod args;
pub mod camera;
pub mod config;
pub mod error;
pub mod font;
pub mod inference;
pub mod live;
pub mod output;
pub mod overlay;
pub mod pipeline;
pub mod telemetry;
pub mod tracker;
pub mod types;
pub mod worker;

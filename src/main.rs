use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use image::RgbImage;
use log::{error, info};

use arm_angles::args::Args;
use arm_angles::camera::{list_cameras, probe_cameras, CameraSource};
use arm_angles::config::AppConfig;
use arm_angles::output::{
    compose_screen, elbow_summary, DeviceSelection, UiAction, UiShell, WindowOutput,
};
use arm_angles::overlay::OverlayStyle;
use arm_angles::pipeline::create_pipeline;
use arm_angles::telemetry::{available_ports, SerialLink};
use arm_angles::tracker::ArmTracker;
use arm_angles::types::AngleReading;
use arm_angles::worker::{CaptureWorker, WorkerEvent, WorkerSettings};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list {
        list_cameras()?;
        println!();
        println!("{}", "Available Serial Ports:".bold());
        let ports = available_ports();
        if ports.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for port in ports {
            println!("  {}", port);
        }
        return Ok(());
    }

    // 0. Load Config, CLI flags win
    let mut config = AppConfig::load_from(&args.config)?;
    if let Some(model) = args.model {
        config.tracking.model_path = model;
    }
    if args.simulate {
        config.tracking.simulate = true;
    }
    if let Some(baud) = args.baud {
        config.telemetry.baud_rate = baud;
    }

    // 1. Devices
    let (cameras, ports) = scan_devices(config.display.probe_count);
    let mut shell = UiShell::new(DeviceSelection::new(cameras, ports));

    // 2. Window
    let (width, height) = (config.display.width, config.display.height);
    let mut window = WindowOutput::new("Arm Angles", width as usize, height as usize)?;
    info!("Controls: [C] Camera [P] Port [O/Enter] Open [R] Rescan [Esc] Quit");

    let mut worker: Option<CaptureWorker> = None;
    let mut last_frame: Option<RgbImage> = None;
    let mut last_reading: Option<AngleReading> = None;

    'ui: while window.is_open() {
        for key in window.keys_pressed() {
            match shell.handle_key(key) {
                UiAction::Nothing => {}
                UiAction::Quit => break 'ui,
                UiAction::Rescan => {
                    // A camera held by the worker would not probe
                    if let Some(running) = worker.take() {
                        running.stop_and_join();
                    }
                    last_frame = None;
                    last_reading = None;
                    let (cameras, ports) = scan_devices(config.display.probe_count);
                    shell.selection.rescan(cameras, ports);
                }
                UiAction::Open => {
                    if let Some(running) = worker.take() {
                        running.stop_and_join();
                    }
                    last_frame = None;
                    last_reading = None;
                    match start_session(&shell.selection, &config) {
                        Ok(started) => worker = Some(started),
                        Err(e) => {
                            error!("Could not start capture: {:#}", e);
                            shell.show_error(format!("{:#}", e));
                        }
                    }
                }
            }
        }

        let mut failed = false;
        if let Some(running) = &worker {
            for event in running.drain() {
                match event {
                    WorkerEvent::Frame { frame, reading } => {
                        last_frame = Some(frame);
                        last_reading = reading;
                    }
                    WorkerEvent::Error(e) => {
                        shell.show_error(e.to_string());
                        failed = true;
                    }
                }
            }
        }
        if failed {
            if let Some(finished) = worker.take() {
                finished.stop_and_join();
            }
        }

        let running = worker.as_ref().is_some_and(|w| w.is_running());
        let screen = compose_screen(
            last_frame.as_ref(),
            width,
            height,
            &format!(
                "{} | {}",
                elbow_summary(last_reading.as_ref()),
                shell.selection.status_line(running)
            ),
            shell.banner(),
        );
        window.present(&screen)?;
    }

    if let Some(running) = worker.take() {
        running.stop_and_join();
    }
    info!("Bye");
    Ok(())
}

fn scan_devices(probe_count: u32) -> (Vec<u32>, Vec<String>) {
    let cameras = probe_cameras(probe_count);
    let ports = available_ports();
    info!(
        "Found {} camera(s) {:?} and {} serial port(s) {:?}",
        cameras.len(),
        cameras,
        ports.len(),
        ports
    );
    (cameras, ports)
}

fn start_session(selection: &DeviceSelection, config: &AppConfig) -> Result<CaptureWorker> {
    let index = selection
        .selected_camera()
        .context("No camera available. Press R to rescan.")?;
    let port = selection.selected_port().unwrap_or_default().to_string();
    let baud_rate = config.telemetry.baud_rate;
    let timeout = config.telemetry.timeout();
    let telemetry_allowed = config.tracking.telemetry_allowed();

    let pipeline = create_pipeline(&config.tracking)?;
    let settings = WorkerSettings {
        tracker: ArmTracker::new(
            config.tracking.visibility_threshold,
            OverlayStyle::from(&config.overlay),
        ),
        display_width: config.display.width,
        mirror: config.display.mirror,
    };

    info!(
        "Opening camera {} (serial: {})",
        index,
        if port.is_empty() || !telemetry_allowed { "none" } else { port.as_str() }
    );
    CaptureWorker::spawn(
        move || CameraSource::open(index),
        pipeline,
        move || SerialLink::open_if(telemetry_allowed, &port, baud_rate, timeout),
        settings,
    )
}

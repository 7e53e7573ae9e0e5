use anyhow::Result;
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use minifb::{Key, KeyRepeat};

use crate::angle::interior_angle;
use crate::font::{draw_text_line, line_height, measure_text_width};
use crate::types::AngleReading;

pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                resize: true,
                ..minifb::WindowOptions::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("Failed to create window: {}", e))?;

        window.limit_update_rate(Some(std::time::Duration::from_micros(16600))); // ~60 FPS

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.window.is_key_down(key)
    }

    pub fn keys_pressed(&self) -> Vec<Key> {
        self.window.get_keys_pressed(KeyRepeat::No)
    }

    /// Pushes a canvas of exactly the window size.
    pub fn present(&mut self, canvas: &RgbImage) -> Result<()> {
        pack_rgb(canvas, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| anyhow::anyhow!("Window update failed: {}", e))
    }
}

/// RGB8 pixels to minifb's 0RGB u32 layout.
pub fn pack_rgb(canvas: &RgbImage, buffer: &mut Vec<u32>) {
    buffer.clear();
    buffer.extend(
        canvas
            .pixels()
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32),
    );
}

/// Devices the user can pick from. Port slot 0 is always "none".
#[derive(Debug, Clone, Default)]
pub struct DeviceSelection {
    cameras: Vec<u32>,
    ports: Vec<String>,
    camera_pos: usize,
    port_pos: usize,
}

impl DeviceSelection {
    pub fn new(cameras: Vec<u32>, ports: Vec<String>) -> Self {
        Self {
            cameras,
            ports,
            camera_pos: 0,
            port_pos: 0,
        }
    }

    pub fn cycle_camera(&mut self) {
        if !self.cameras.is_empty() {
            self.camera_pos = (self.camera_pos + 1) % self.cameras.len();
        }
    }

    pub fn cycle_port(&mut self) {
        self.port_pos = (self.port_pos + 1) % (self.ports.len() + 1);
    }

    pub fn selected_camera(&self) -> Option<u32> {
        self.cameras.get(self.camera_pos).copied()
    }

    pub fn selected_port(&self) -> Option<&str> {
        match self.port_pos {
            0 => None,
            n => self.ports.get(n - 1).map(String::as_str),
        }
    }

    /// Replaces the device lists, keeping the current picks when they still exist.
    pub fn rescan(&mut self, cameras: Vec<u32>, ports: Vec<String>) {
        let camera = self.selected_camera();
        let port = self.selected_port().map(str::to_string);

        self.camera_pos = camera
            .and_then(|c| cameras.iter().position(|&x| x == c))
            .unwrap_or(0);
        self.port_pos = port
            .and_then(|p| ports.iter().position(|x| *x == p))
            .map_or(0, |i| i + 1);
        self.cameras = cameras;
        self.ports = ports;
    }

    pub fn status_line(&self, running: bool) -> String {
        let camera = self
            .selected_camera()
            .map_or_else(|| "NONE FOUND".to_string(), |c| c.to_string());
        let port = self.selected_port().unwrap_or("NONE");
        let state = if running { "RUNNING" } else { "IDLE" };
        format!(
            "CAM {} | PORT {} | {} | C CAMERA  P PORT  O OPEN  R RESCAN  ESC QUIT",
            camera, port, state
        )
    }
}

/// Unsigned elbow bends for the status bar, e.g. `ELBOWS L 90 R 180`.
pub fn elbow_summary(reading: Option<&AngleReading>) -> String {
    match reading {
        Some(r) => format!(
            "ELBOWS L {:.0} R {:.0}",
            interior_angle(r.left_degrees),
            interior_angle(r.right_degrees)
        ),
        None => "ELBOWS --".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Nothing,
    Open,
    Rescan,
    Quit,
}

/// Keyboard state of the main window. While an error banner is up only
/// Enter and Escape do anything, and both just dismiss it.
#[derive(Debug, Default)]
pub struct UiShell {
    pub selection: DeviceSelection,
    banner: Option<String>,
}

impl UiShell {
    pub fn new(selection: DeviceSelection) -> Self {
        Self {
            selection,
            banner: None,
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.banner = Some(message.into());
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn handle_key(&mut self, key: Key) -> UiAction {
        if self.banner.is_some() {
            if matches!(key, Key::Enter | Key::NumPadEnter | Key::Escape) {
                self.banner = None;
            }
            return UiAction::Nothing;
        }

        match key {
            Key::C => {
                self.selection.cycle_camera();
                UiAction::Nothing
            }
            Key::P => {
                self.selection.cycle_port();
                UiAction::Nothing
            }
            Key::O | Key::Enter | Key::NumPadEnter => UiAction::Open,
            Key::R => UiAction::Rescan,
            Key::Escape => UiAction::Quit,
            _ => UiAction::Nothing,
        }
    }
}

const TEXT_SCALE: u32 = 2;
const BAR_PADDING: u32 = 4;
const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const BAR_COLOR: Rgb<u8> = Rgb([40, 40, 40]);
const TEXT_COLOR: Rgb<u8> = Rgb([230, 230, 230]);
const BANNER_COLOR: Rgb<u8> = Rgb([120, 20, 20]);

pub const BANNER_TITLE: &str = "Camera Error";
pub const BANNER_LEAD: &str = "An error occurred while opening the camera:";

/// Builds the full window image: latest frame at the top left, status bar
/// along the bottom, and the error banner on top when present.
pub fn compose_screen(
    frame: Option<&RgbImage>,
    width: u32,
    height: u32,
    status: &str,
    banner: Option<&str>,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    if let Some(frame) = frame {
        imageops::overlay(&mut canvas, frame, 0, 0);
    }

    let bar_height = line_height(TEXT_SCALE) + 2 * BAR_PADDING;
    let bar_top = height.saturating_sub(bar_height);
    draw_filled_rect_mut(
        &mut canvas,
        Rect::at(0, bar_top as i32).of_size(width.max(1), bar_height),
        BAR_COLOR,
    );
    draw_text_line(
        &mut canvas,
        BAR_PADDING as i32,
        (bar_top + BAR_PADDING) as i32,
        status,
        TEXT_COLOR,
        TEXT_SCALE,
    );

    if let Some(message) = banner {
        draw_banner(&mut canvas, message);
    }
    canvas
}

fn draw_banner(canvas: &mut RgbImage, message: &str) {
    let (width, height) = canvas.dimensions();
    let box_width = width * 3 / 4;
    let max_chars = (box_width.saturating_sub(4 * BAR_PADDING) / measure_text_width("X", TEXT_SCALE)).max(1);

    let mut lines = vec![BANNER_TITLE.to_string(), String::new(), BANNER_LEAD.to_string()];
    lines.extend(wrap(message, max_chars as usize));
    lines.push(String::new());
    lines.push("Press Enter or Esc".to_string());

    let step = line_height(TEXT_SCALE) + BAR_PADDING;
    let box_height = lines.len() as u32 * step + 4 * BAR_PADDING;
    let left = (width.saturating_sub(box_width) / 2) as i32;
    let top = (height.saturating_sub(box_height) / 2) as i32;

    draw_filled_rect_mut(
        canvas,
        Rect::at(left, top).of_size(box_width.max(1), box_height),
        BANNER_COLOR,
    );
    for (i, line) in lines.iter().enumerate() {
        let y = top + (2 * BAR_PADDING + i as u32 * step) as i32;
        draw_text_line(canvas, left + 2 * BAR_PADDING as i32, y, line, TEXT_COLOR, TEXT_SCALE);
    }
}

/// Greedy word wrap; words longer than a line are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..max_chars).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> DeviceSelection {
        DeviceSelection::new(vec![0, 2], vec!["COM3".to_string(), "COM4".to_string()])
    }

    #[test]
    fn port_cycle_includes_none() {
        let mut sel = selection();
        assert_eq!(sel.selected_port(), None);
        sel.cycle_port();
        assert_eq!(sel.selected_port(), Some("COM3"));
        sel.cycle_port();
        assert_eq!(sel.selected_port(), Some("COM4"));
        sel.cycle_port();
        assert_eq!(sel.selected_port(), None);
    }

    #[test]
    fn camera_cycle_wraps() {
        let mut sel = selection();
        assert_eq!(sel.selected_camera(), Some(0));
        sel.cycle_camera();
        assert_eq!(sel.selected_camera(), Some(2));
        sel.cycle_camera();
        assert_eq!(sel.selected_camera(), Some(0));

        let mut empty = DeviceSelection::new(vec![], vec![]);
        empty.cycle_camera();
        assert_eq!(empty.selected_camera(), None);
        assert!(empty.status_line(false).contains("NONE FOUND"));
    }

    #[test]
    fn rescan_keeps_surviving_picks() {
        let mut sel = selection();
        sel.cycle_camera();
        sel.cycle_port();
        sel.cycle_port();
        sel.rescan(vec![1, 2], vec!["COM4".to_string()]);
        assert_eq!(sel.selected_camera(), Some(2));
        assert_eq!(sel.selected_port(), Some("COM4"));

        sel.rescan(vec![1], vec![]);
        assert_eq!(sel.selected_camera(), Some(1));
        assert_eq!(sel.selected_port(), None);
    }

    #[test]
    fn banner_is_modal() {
        let mut shell = UiShell::new(selection());
        shell.show_error("device busy");

        assert_eq!(shell.handle_key(Key::C), UiAction::Nothing);
        assert_eq!(shell.handle_key(Key::O), UiAction::Nothing);
        assert_eq!(shell.selection.selected_camera(), Some(0));
        assert!(shell.banner().is_some());

        // Escape dismisses instead of quitting
        assert_eq!(shell.handle_key(Key::Escape), UiAction::Nothing);
        assert!(shell.banner().is_none());
        assert_eq!(shell.handle_key(Key::Escape), UiAction::Quit);
    }

    #[test]
    fn key_bindings() {
        let mut shell = UiShell::new(selection());
        assert_eq!(shell.handle_key(Key::Enter), UiAction::Open);
        assert_eq!(shell.handle_key(Key::O), UiAction::Open);
        assert_eq!(shell.handle_key(Key::R), UiAction::Rescan);
        assert_eq!(shell.handle_key(Key::P), UiAction::Nothing);
        assert_eq!(shell.selection.selected_port(), Some("COM3"));
    }

    #[test]
    fn elbow_summary_folds_sweep() {
        let reading = AngleReading {
            left_degrees: 270.0,
            right_degrees: 180.0,
        };
        assert_eq!(elbow_summary(Some(&reading)), "ELBOWS L 90 R 180");
        assert_eq!(elbow_summary(None), "ELBOWS --");
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("Camera could not be opened (index 4): no such device", 12);
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
        assert_eq!(lines.join(" "), "Camera could not be opened (index 4): no such device");
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn screen_has_frame_bar_and_banner() {
        let frame = RgbImage::from_pixel(10, 10, Rgb([0, 200, 0]));
        let plain = compose_screen(Some(&frame), 200, 100, "CAM 0", None);
        assert_eq!(plain.dimensions(), (200, 100));
        assert_eq!(*plain.get_pixel(5, 5), Rgb([0, 200, 0]));
        assert_eq!(*plain.get_pixel(150, 99), BAR_COLOR);

        let with_banner = compose_screen(Some(&frame), 200, 100, "CAM 0", Some("busy"));
        assert!(with_banner.pixels().any(|p| *p == BANNER_COLOR));
    }

    #[test]
    fn packs_pixels_for_minifb() {
        let canvas = RgbImage::from_pixel(2, 1, Rgb([0x12, 0x34, 0x56]));
        let mut buffer = Vec::new();
        pack_rgb(&canvas, &mut buffer);
        assert_eq!(buffer, vec![0x123456, 0x123456]);
    }
}

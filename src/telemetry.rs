use std::fmt;
use std::io::Write;
use std::time::Duration;

use log::{debug, info, warn};
use serialport::SerialPort;

use crate::error::TelemetryError;
use crate::types::AngleReading;

/// One line of the serial protocol: `L:<left>,R:<right>\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialMessage(String);

impl SerialMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for SerialMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a reading with exactly two fractional digits per side.
pub fn format_message(reading: &AngleReading) -> SerialMessage {
    SerialMessage(format!(
        "L:{:.2},R:{:.2}\n",
        reading.left_degrees, reading.right_degrees
    ))
}

/// Destination for angle readings.
pub trait TelemetrySink {
    fn send(&mut self, message: &SerialMessage) -> Result<(), TelemetryError>;

    fn send_reading(&mut self, reading: &AngleReading) -> Result<(), TelemetryError> {
        self.send(&format_message(reading))
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Box<T> {
    fn send(&mut self, message: &SerialMessage) -> Result<(), TelemetryError> {
        (**self).send(message)
    }
}

/// Serial connection to the microcontroller. Closed on drop.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialLink {
    pub const DEFAULT_BAUD: u32 = 9600;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn open(name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TelemetryError> {
        let port = serialport::new(name, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|source| TelemetryError::Open {
                port: name.to_string(),
                source,
            })?;
        info!("Opened serial port {} at {} baud", name, baud_rate);
        Ok(Self {
            port,
            name: name.to_string(),
        })
    }

    /// Opens `name` unless it is blank, which means telemetry is disabled.
    pub fn open_optional(
        name: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Option<Self>, TelemetryError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        Self::open(name, baud_rate, timeout).map(Some)
    }

    /// Opens nothing when `enabled` is false, whatever port was picked.
    pub fn open_if(
        enabled: bool,
        name: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Option<Self>, TelemetryError> {
        if !enabled {
            if !name.trim().is_empty() {
                warn!("Serial output to {} is off for this session", name.trim());
            }
            return Ok(None);
        }
        Self::open_optional(name, baud_rate, timeout)
    }
}

impl TelemetrySink for SerialLink {
    fn send(&mut self, message: &SerialMessage) -> Result<(), TelemetryError> {
        self.port.write_all(message.as_bytes())?;
        debug!("{} <- {}", self.name, message.as_str().trim_end());
        Ok(())
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        let _ = self.port.flush();
        info!("Closed serial port {}", self.name);
    }
}

/// Names of the serial devices the OS reports. Enumeration failure yields an
/// empty list.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!("Serial port enumeration failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        lines: Vec<String>,
    }

    impl TelemetrySink for Recorder {
        fn send(&mut self, message: &SerialMessage) -> Result<(), TelemetryError> {
            self.lines.push(message.to_string());
            Ok(())
        }
    }

    fn reading(left: f64, right: f64) -> AngleReading {
        AngleReading {
            left_degrees: left,
            right_degrees: right,
        }
    }

    #[test]
    fn exact_wire_format() {
        let msg = format_message(&reading(12.3, 7.0));
        assert_eq!(msg.as_str(), "L:12.30,R:7.00\n");
        assert_eq!(msg.as_bytes(), b"L:12.30,R:7.00\n");
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(format_message(&reading(359.999, 0.004)).as_str(), "L:360.00,R:0.00\n");
        assert_eq!(format_message(&reading(90.126, 180.0)).as_str(), "L:90.13,R:180.00\n");
    }

    #[test]
    fn any_finite_value_formats() {
        let msg = format_message(&reading(-1.5, 1.0e6));
        assert_eq!(msg.as_str(), "L:-1.50,R:1000000.00\n");
    }

    #[test]
    fn send_reading_formats_once() {
        let mut sink = Recorder::default();
        sink.send_reading(&reading(45.0, 135.5)).unwrap();
        assert_eq!(sink.lines, vec!["L:45.00,R:135.50\n".to_string()]);
    }

    #[test]
    fn boxed_sink_forwards() {
        let mut sink: Box<Recorder> = Box::default();
        sink.send_reading(&reading(1.0, 2.0)).unwrap();
        assert_eq!(sink.lines.len(), 1);
    }

    #[test]
    fn blank_port_disables_telemetry() {
        let link = SerialLink::open_optional("  ", 9600, SerialLink::DEFAULT_TIMEOUT).unwrap();
        assert!(link.is_none());
    }

    #[test]
    fn disabled_link_never_touches_the_port() {
        // Would fail to open if it were tried
        let link = SerialLink::open_if(
            false,
            "/dev/arm-angles-no-such-port",
            SerialLink::DEFAULT_BAUD,
            SerialLink::DEFAULT_TIMEOUT,
        )
        .unwrap();
        assert!(link.is_none());
    }
}

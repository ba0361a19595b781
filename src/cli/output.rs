//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::domain::TemperatureSample;
use crate::error::SessionError;
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_output(&mut handle, data, format)
}

/// Format output into any writer
pub fn write_output<W: Write, T: Serialize + TableDisplay>(
    out: &mut W,
    data: &T,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(out, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(out, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// Device count display
#[derive(Debug, Clone, Serialize)]
pub struct DeviceCount {
    pub count: u32,
}

impl TableDisplay for DeviceCount {
    fn to_table(&self) -> String {
        format!("GPUs Found: {}", self.count)
    }

    fn to_compact(&self) -> String {
        self.count.to_string()
    }
}

/// Temperatures for one GPU, or the reason they are missing
#[derive(Debug, Clone, Serialize)]
pub struct GpuTemperatures {
    pub gpu_index: u32,
    pub gpu_name: Option<String>,
    /// Core temperature in Celsius
    pub gpu_temp: Option<i32>,
    /// Junction (hotspot) temperature in Celsius
    pub junction_temp: Option<i32>,
    /// Memory temperature in Celsius
    pub vram_temp: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GpuTemperatures {
    /// Build from a session result
    pub fn from_result(
        gpu_index: u32,
        gpu_name: Option<String>,
        result: &Result<TemperatureSample, SessionError>,
    ) -> Self {
        match result {
            Ok(sample) => Self {
                gpu_index,
                gpu_name,
                gpu_temp: Some(sample.core.as_celsius()),
                junction_temp: Some(sample.junction.as_celsius()),
                vram_temp: Some(sample.vram.as_celsius()),
                error: None,
            },
            Err(e) => Self {
                gpu_index,
                gpu_name,
                gpu_temp: None,
                junction_temp: None,
                vram_temp: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn label(&self) -> String {
        match &self.gpu_name {
            Some(name) => format!("[{}] {}", self.gpu_index, name),
            None => format!("[{}]", self.gpu_index),
        }
    }
}

impl TableDisplay for GpuTemperatures {
    fn to_table(&self) -> String {
        match (self.gpu_temp, self.junction_temp, self.vram_temp) {
            (Some(core), Some(junction), Some(vram)) => format!(
                "{}\n  Core Temperature:     {}°C\n  Junction Temperature: {}°C\n  VRAM Temperature:     {}°C",
                self.label(),
                core,
                junction,
                vram
            ),
            _ => format!(
                "{}\n  Failed to read temperatures: {}",
                self.label(),
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    fn to_compact(&self) -> String {
        match (self.gpu_temp, self.junction_temp, self.vram_temp) {
            (Some(core), Some(junction), Some(vram)) => {
                format!("{}:{}/{}/{}", self.gpu_index, core, junction, vram)
            }
            _ => format!("{}:error", self.gpu_index),
        }
    }
}

/// Temperatures for every sampled GPU
#[derive(Debug, Clone, Serialize)]
pub struct TemperatureReport {
    pub gpus: Vec<GpuTemperatures>,
}

impl TableDisplay for TemperatureReport {
    fn to_table(&self) -> String {
        self.gpus
            .iter()
            .map(|g| g.to_table())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn to_compact(&self) -> String {
        self.gpus
            .iter()
            .map(|g| g.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeviceIdentity, Temperature};

    fn ok_entry() -> GpuTemperatures {
        let sample = TemperatureSample::new(
            Temperature::new(45),
            Temperature::new(50),
            Temperature::new(10),
        );
        GpuTemperatures::from_result(0, Some("RTX 3090".to_string()), &Ok(sample))
    }

    fn failed_entry() -> GpuTemperatures {
        let err = SessionError::Correlation(DeviceIdentity::new(0x2204_10DE, 0, 1, 0));
        GpuTemperatures::from_result(1, None, &Err(err))
    }

    #[test]
    fn test_table_output() {
        let table = ok_entry().to_table();
        assert!(table.starts_with("[0] RTX 3090"));
        assert!(table.contains("Junction Temperature: 50°C"));
        assert!(table.contains("VRAM Temperature:     10°C"));
    }

    #[test]
    fn test_failed_entry_has_no_temperatures() {
        let entry = failed_entry();
        assert!(entry.gpu_temp.is_none());
        assert!(entry.junction_temp.is_none());
        assert!(entry.vram_temp.is_none());
        assert!(entry.to_table().contains("No PCI device matches"));
        assert_eq!(entry.to_compact(), "1:error");
    }

    #[test]
    fn test_compact_report() {
        let report = TemperatureReport {
            gpus: vec![ok_entry(), failed_entry()],
        };
        assert_eq!(report.to_compact(), "0:45/50/10, 1:error");
    }

    #[test]
    fn test_json_output() {
        let mut buf = Vec::new();
        write_output(&mut buf, &ok_entry(), OutputFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["gpu_temp"], 45);
        assert_eq!(value["junction_temp"], 50);
        assert_eq!(value["vram_temp"], 10);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_count_output() {
        let mut buf = Vec::new();
        write_output(&mut buf, &DeviceCount { count: 2 }, OutputFormat::Compact).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "2\n");
    }
}

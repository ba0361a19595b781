//! Read command implementation
//!
//! Samples temperatures once for the selected GPU or every GPU.

use crate::cli::args::OutputFormat;
use crate::cli::output::print_output;
use crate::commands::{build_report, open_session};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::{Monitor, MonitorConfig};

/// Execute the read command
pub fn run_read(config: &Config, format: OutputFormat) -> Result<()> {
    let mut session = open_session(config)?;

    let monitor = Monitor::new(MonitorConfig {
        gpu: config.gpu.index,
        ..MonitorConfig::default()
    });
    let batch = monitor.tick(&session)?;
    let report = build_report(&session, &batch);

    print_output(&report, format)?;
    session.close();

    let total = batch.len();
    let mut errors = batch.into_iter().filter_map(|(_, result)| result.err());
    match (total, errors.next()) {
        (_, None) => Ok(()),
        // A single GPU reports its own error
        (1, Some(e)) => Err(e.into()),
        (_, Some(_)) => Err(AppError::SampleFailed {
            failed: 1 + errors.count(),
            total,
        }),
    }
}

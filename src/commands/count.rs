//! Count command implementation
//!
//! Prints the number of GPUs a session discovered.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, DeviceCount};
use crate::commands::open_session;
use crate::config::Config;
use crate::error::Result;

/// Execute the count command
pub fn run_count(config: &Config, format: OutputFormat) -> Result<()> {
    let mut session = open_session(config)?;
    let count = session.device_count()?;

    print_output(&DeviceCount { count }, format)?;

    session.close();
    Ok(())
}

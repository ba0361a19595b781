//! Watch command implementation
//!
//! Polls temperatures until interrupted or the iteration limit is reached.

use crate::cli::args::{OutputFormat, WatchArgs};
use crate::cli::output::print_output;
use crate::commands::{build_report, open_session};
use crate::config::Config;
use crate::error::Result;
use crate::services::{Monitor, MonitorConfig};

use std::sync::atomic::Ordering;

/// Execute the watch command
pub fn run_watch(args: &WatchArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let mut session = open_session(config)?;
    log::info!(
        "Watching {} GPU(s) every {}s",
        session.device_count()?,
        config.general.interval_seconds
    );

    let monitor = Monitor::new(MonitorConfig {
        interval: config.general.interval(),
        iterations: args.iterations,
        gpu: config.gpu.index,
    });

    // SIGINT/SIGTERM end the loop so the session is closed below
    let stop = monitor.stop_handle();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        stop.store(true, Ordering::SeqCst);
    })?;

    let result = monitor.run(&session, |tick, batch| {
        if tick > 0 && matches!(format, OutputFormat::Table) {
            println!();
        }
        let report = build_report(&session, batch);
        print_output(&report, format)?;
        Ok(())
    });

    session.close();
    result
}

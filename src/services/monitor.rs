//! Polling monitor
//!
//! Samples a session at a fixed interval and hands each batch to a sink.

use crate::domain::TemperatureSample;
use crate::error::{AppError, SessionError};
use crate::mem::PhysicalMemory;
use crate::nvml::GpuManager;
use crate::services::Session;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity at which a sleeping loop notices a stop request
const STOP_POLL: Duration = Duration::from_millis(100);

/// One GPU's result within a polling tick
pub type SampleResult = (u32, Result<TemperatureSample, SessionError>);

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between ticks
    pub interval: Duration,
    /// Stop after this many ticks; run forever when `None`
    pub iterations: Option<u64>,
    /// Only sample this GPU
    pub gpu: Option<u32>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            iterations: None,
            gpu: None,
        }
    }
}

/// Polling monitor
pub struct Monitor {
    config: MonitorConfig,
    stop: Arc<AtomicBool>,
}

impl Monitor {
    /// Create a new monitor with the given configuration
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that ends [`Monitor::run`] once set
    ///
    /// The loop checks it between ticks and while sleeping, then returns
    /// normally so the caller can close its session.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Sleep for the interval, waking early on a stop request
    fn wait(&self) {
        let deadline = Instant::now() + self.config.interval;
        while !self.stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(STOP_POLL.min(deadline - now));
        }
    }

    /// Sample the selected GPUs once
    ///
    /// Per-GPU failures are returned inside the batch; only errors that
    /// make the session unusable abort the tick.
    pub fn tick<M, P>(&self, session: &Session<M, P>) -> Result<Vec<SampleResult>, SessionError>
    where
        M: GpuManager,
        P: PhysicalMemory,
    {
        match self.config.gpu {
            Some(index) => Ok(vec![(index, session.temperatures(index))]),
            None => session.temperatures_all(),
        }
    }

    /// Run the polling loop
    ///
    /// A failed read is reported to the sink and never retried within the
    /// same tick. An error from the sink stops the loop.
    pub fn run<M, P, F>(&self, session: &Session<M, P>, mut sink: F) -> Result<(), AppError>
    where
        M: GpuManager,
        P: PhysicalMemory,
        F: FnMut(u64, &[SampleResult]) -> Result<(), AppError>,
    {
        if let Some(index) = self.config.gpu {
            let count = session.device_count()?;
            if index >= count {
                return Err(SessionError::InvalidIndex { index, count }.into());
            }
        }

        let mut tick = 0u64;
        while !self.stopped() {
            let batch = self.tick(session)?;
            for (index, result) in &batch {
                match result {
                    Ok(sample) if sample.hottest().is_critical() => {
                        log::warn!("GPU {} is running hot: {}", index, sample)
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("GPU {} sample failed: {}", index, e),
                }
            }
            sink(tick, &batch)?;
            tick += 1;

            if self.config.iterations.is_some_and(|n| tick >= n) {
                log::info!("Stopping after {} iteration(s)", tick);
                break;
            }

            self.wait();
        }

        if self.stopped() {
            log::info!("Stopped after {} iteration(s)", tick);
        }

        Ok(())
    }

    /// Get the monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

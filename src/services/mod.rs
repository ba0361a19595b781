//! Service layer
//!
//! The session correlates NVML and PCI devices to read temperatures; the
//! monitor polls a session on an interval.

pub mod monitor;
pub mod session;

pub use monitor::{Monitor, MonitorConfig, SampleResult};
pub use session::{Session, SessionState, SystemSession};

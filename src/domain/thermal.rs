//! Thermal domain types
//!
//! Provides the temperature value type and the composite sample returned
//! by a session query.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Temperature(i32);

impl Temperature {
    /// Create a new Temperature
    pub const fn new(celsius: i32) -> Self {
        Self(celsius)
    }

    /// Get the temperature in Celsius
    #[inline]
    pub const fn as_celsius(&self) -> i32 {
        self.0
    }

    /// Check if temperature is critical (above 90°C typically)
    pub fn is_critical(&self) -> bool {
        self.0 >= 90
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

impl From<i32> for Temperature {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<u32> for Temperature {
    fn from(value: u32) -> Self {
        Self::new(value as i32)
    }
}

impl From<Temperature> for i32 {
    fn from(temp: Temperature) -> Self {
        temp.0
    }
}

/// One point-in-time reading of all three GPU temperatures
///
/// A sample is only ever constructed with every field populated; a failed
/// query yields an error instead of a partial sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureSample {
    /// Core temperature reported by NVML
    pub core: Temperature,
    /// Junction (hotspot) temperature from the hotspot register
    pub junction: Temperature,
    /// Memory temperature from the VRAM register
    pub vram: Temperature,
}

impl TemperatureSample {
    /// Create a new sample
    pub fn new(core: Temperature, junction: Temperature, vram: Temperature) -> Self {
        Self {
            core,
            junction,
            vram,
        }
    }

    /// Hottest of the three readings
    pub fn hottest(&self) -> Temperature {
        self.core.max(self.junction).max(self.vram)
    }
}

impl fmt::Display for TemperatureSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "core {}, junction {}, vram {}",
            self.core, self.junction, self.vram
        )
    }
}

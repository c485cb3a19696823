//! Allocation retry and numbering format configuration.

use std::time::Duration;

use chrono::FixedOffset;
use serde::Deserialize;

use super::ConfigError;
use crate::model::DEFAULT_PAD_WIDTH;

/// Largest UTC offset accepted for the scope calendar, in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Retry policy for finalization under contention.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Total finalize attempts, including the first (must be at least 1).
    pub max_attempts: u32,
    /// Delay before the first retry. Zero retries immediately.
    pub min_delay_ms: u64,
    /// Cap on the delay between retries.
    pub max_delay_ms: u64,
    /// Randomize delays so contending callers spread out.
    pub jitter: bool,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            min_delay_ms: 5,
            max_delay_ms: 250,
            jitter: true,
        }
    }
}

impl AllocationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(ConfigError::InvalidDelays {
                min_ms: self.min_delay_ms,
                max_ms: self.max_delay_ms,
            });
        }
        Ok(())
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// How scope keys and display numbers are derived.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    /// Zero-padding width of the sequence in a display number.
    pub pad_width: usize,
    /// Offset from UTC of the calendar whose year is the scope key.
    pub utc_offset_minutes: i32,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            pad_width: DEFAULT_PAD_WIDTH,
            utc_offset_minutes: 0,
        }
    }
}

impl NumberingConfig {
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::InvalidUtcOffset(self.utc_offset_minutes));
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or(ConfigError::InvalidUtcOffset(self.utc_offset_minutes))
    }
}

//! Clock readings delivered to the sequence once per tick.

use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::Serialize;

use super::constants::TRIGGER_COUNT_WRAP;
use super::error::{CoreError, CoreResult};

/// One tick of the clock driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockReading {
    /// Unix seconds
    pub timestamp: i64,
    /// Monotonic tick counter, wraps at `TRIGGER_COUNT_WRAP`
    pub trigger_count: u64,
    /// First tick of a new clock hour
    pub new_hour: bool,
    /// First tick of a new calendar day (implies `new_hour`)
    pub new_day: bool,
}

impl ClockReading {
    /// Reading for a tick with no hour or day boundary.
    pub fn at(timestamp: i64, trigger_count: u64) -> Self {
        Self {
            timestamp,
            trigger_count,
            new_hour: false,
            new_day: false,
        }
    }
}

/// Turns raw timestamps from an outside source into clock readings.
#[derive(Debug, Default)]
pub struct ClockPort {
    previous: Option<DateTime<Utc>>,
    trigger_count: u64,
}

impl ClockPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a new timestamp, deriving the hour and day boundary flags in UTC.
    pub fn read(&mut self, timestamp: i64) -> CoreResult<ClockReading> {
        let now = Utc
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or_else(|| CoreError::key_not_valid(format!("timestamp {} not representable", timestamp)))?;

        let (new_hour, new_day) = match self.previous {
            Some(prev) if prev == now => return Err(CoreError::TimestampSameAsPrevious(timestamp)),
            Some(prev) => {
                let new_day = prev.date_naive() != now.date_naive();
                let new_hour = new_day || prev.hour() != now.hour();
                (new_hour, new_day)
            }
            None => (true, true),
        };

        self.trigger_count = if self.trigger_count + 1 >= TRIGGER_COUNT_WRAP {
            0
        } else {
            self.trigger_count + 1
        };
        self.previous = Some(now);

        Ok(ClockReading {
            timestamp,
            trigger_count: self.trigger_count,
            new_hour,
            new_day,
        })
    }
}

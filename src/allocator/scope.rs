//! Scope derivation and clocks.

use std::sync::Mutex;

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};

use crate::model::ScopeKey;

/// Source of the finalization instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Maps a finalization instant to the scope its number is drawn from.
///
/// Must be pure: the same instant always yields the same scope.
pub trait ScopePolicy: Send + Sync {
    fn scope_for(&self, at: DateTime<Utc>) -> ScopeKey;
}

/// Scope is the calendar year at a fixed UTC offset.
///
/// The offset decides which year an instant near midnight on New Year's Eve
/// belongs to.
#[derive(Debug, Clone, Copy)]
pub struct CalendarYear {
    offset: FixedOffset,
}

impl CalendarYear {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }
}

impl ScopePolicy for CalendarYear {
    fn scope_for(&self, at: DateTime<Utc>) -> ScopeKey {
        ScopeKey::from_year(at.with_timezone(&self.offset).year())
    }
}

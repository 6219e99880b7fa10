//! World clock: a monotonic tick counter with a derived calendar.

/// The four seasons, derived from a tick's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

/// Calendar position derived from a raw tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    pub year: u64,
    pub day_in_year: u64,
    pub month: u64,
    pub season: Season,
}

/// Monotonic non-negative tick counter plus a derived calendar.
///
/// `ticks_per_year` is configurable (default 360, 30 days/month, 12
/// months/year) but the calendar math below assumes the default's
/// 30-day month; a non-default `ticks_per_year` only changes the modulus
/// used for year/day derivation, not the days-per-month constant.
#[derive(Debug, Clone, Copy)]
pub struct WorldClock {
    tick: u64,
    ticks_per_year: u64,
}

const DAYS_PER_MONTH: u64 = 30;

impl Default for WorldClock {
    fn default() -> Self {
        Self::new(360)
    }
}

impl WorldClock {
    pub fn new(ticks_per_year: u64) -> Self {
        Self {
            tick: 0,
            ticks_per_year,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance by exactly one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Force the tick counter to `n`. Used by snapshot restore.
    pub fn set_tick(&mut self, n: u64) {
        self.tick = n;
    }

    /// The derived calendar date for the current tick.
    pub fn calendar(&self) -> CalendarDate {
        let year = self.tick / self.ticks_per_year + 1;
        let day_in_year = self.tick % self.ticks_per_year;
        let month = day_in_year / DAYS_PER_MONTH;
        let season = match month {
            0..=2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        };
        CalendarDate {
            year,
            day_in_year,
            month,
            season,
        }
    }
}

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::{fmt, str::FromStr, sync::Mutex};

/// Which calendar decides where one day ends and the next begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundary {
    #[default]
    Utc,
    Local,
}

impl FromStr for DayBoundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(DayBoundary::Utc),
            "local" => Ok(DayBoundary::Local),
            other => Err(format!("unknown day boundary '{other}'")),
        }
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayBoundary::Utc => f.write_str("utc"),
            DayBoundary::Local => f.write_str("local"),
        }
    }
}

/// Source of "now" for the tracker, so tests can move across days without
/// waiting for the wall clock.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate;
}

pub struct SystemClock {
    boundary: DayBoundary,
}

impl SystemClock {
    pub fn new(boundary: DayBoundary) -> Self {
        Self { boundary }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        match self.boundary {
            DayBoundary::Utc => Utc::now().date_naive(),
            DayBoundary::Local => Local::now().date_naive(),
        }
    }
}

/// A clock that only moves when told to. Days follow UTC.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Midnight UTC of the given date.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::default()).and_utc())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_moves_only_when_advanced() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let clock = FixedClock::at_date(start);
        assert_eq!(clock.today(), start);
        assert_eq!(clock.today(), start);

        clock.advance(Duration::hours(23));
        assert_eq!(clock.today(), start);

        clock.advance(Duration::hours(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn day_boundary_parses() {
        assert_eq!("UTC".parse::<DayBoundary>(), Ok(DayBoundary::Utc));
        assert_eq!(" local ".parse::<DayBoundary>(), Ok(DayBoundary::Local));
        assert!("mars".parse::<DayBoundary>().is_err());
    }
}

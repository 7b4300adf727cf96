use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use std::time::{SystemTime, UNIX_EPOCH};

/// `at` as a UTC timestamp, or `None` when chrono cannot represent it.
/// Instants before the epoch are supported.
pub fn utc_of(at: SystemTime) -> Option<DateTime<Utc>> {
    let (secs, nanos) = match at.duration_since(UNIX_EPOCH) {
        Ok(after) => (i64::try_from(after.as_secs()).ok()?, after.subsec_nanos()),
        Err(err) => {
            let before = err.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => (-secs, 0),
                n => (-secs - 1, 1_000_000_000 - n),
            }
        }
    };
    DateTime::from_timestamp(secs, nanos)
}

/// Zone used to turn a timestamp into the calendar date that names a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateZone {
    Local,
    Named(Tz),
}

impl DateZone {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|err| anyhow!("invalid timezone `{name}`: {err}")),
        }
    }

    pub fn date_of(self, at: SystemTime) -> Option<NaiveDate> {
        let utc = utc_of(at)?;
        Some(match self {
            Self::Local => utc.with_timezone(&Local).date_naive(),
            Self::Named(tz) => utc.with_timezone(&tz).date_naive(),
        })
    }
}

/// "Now" for a whole run, captured once.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    now: SystemTime,
    today: NaiveDate,
    zone: DateZone,
}

impl RunClock {
    pub fn new(now: SystemTime, zone: DateZone) -> Result<Self> {
        let today = zone
            .date_of(now)
            .ok_or_else(|| anyhow!("current time {now:?} is outside the supported date range"))?;
        Ok(Self { now, today, zone })
    }

    pub fn start(zone: DateZone) -> Result<Self> {
        Self::new(SystemTime::now(), zone)
    }

    pub fn now(&self) -> SystemTime {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn date_of(&self, at: SystemTime) -> Option<NaiveDate> {
        self.zone.date_of(at)
    }
}
